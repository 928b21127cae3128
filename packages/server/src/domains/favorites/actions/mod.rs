use tracing::info;

use crate::common::{AppError, ListingId};
use crate::domains::accounts::models::Account;
use crate::domains::favorites::models::{Favorite, FavoriteView};
use crate::kernel::{ServerDeps, StoreError};

fn parse_listing_id(raw: &str) -> Result<ListingId, AppError> {
    ListingId::parse(raw).map_err(|_| AppError::NotFound("Listing"))
}

/// Bookmark a listing for the caller.
pub async fn add_favorite(
    account: &Account,
    raw_listing_id: &str,
    deps: &ServerDeps,
) -> Result<Favorite, AppError> {
    let listing_id = parse_listing_id(raw_listing_id)?;
    if deps.listings.find_listing(listing_id).await?.is_none() {
        return Err(AppError::NotFound("Listing"));
    }

    let favorite = deps
        .favorites
        .add_favorite(account.id, listing_id, deps.clock.now())
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => AppError::Conflict("Listing is already in favorites".into()),
            other => other.into(),
        })?;

    info!(account_id = %account.id, listing_id = %listing_id, "Favorite added");
    Ok(favorite)
}

pub async fn remove_favorite(
    account: &Account,
    raw_listing_id: &str,
    deps: &ServerDeps,
) -> Result<(), AppError> {
    let listing_id = parse_listing_id(raw_listing_id)?;
    if !deps.favorites.remove_favorite(account.id, listing_id).await? {
        return Err(AppError::NotFound("Favorite"));
    }
    info!(account_id = %account.id, listing_id = %listing_id, "Favorite removed");
    Ok(())
}

/// The caller's favorites, newest first.
pub async fn list_favorites(account: &Account, deps: &ServerDeps) -> Result<Vec<FavoriteView>, AppError> {
    Ok(deps
        .favorites
        .list_favorites(account.id)
        .await?
        .into_iter()
        .map(FavoriteView::from)
        .collect())
}
