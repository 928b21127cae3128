use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::common::{AccountId, FavoriteId, ListingId};
use crate::domains::listings::models::{Listing, ListingRow, ListingView};
use crate::kernel::StoreError;

/// An account's bookmark on a listing. At most one per (account, listing).
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    pub account_id: AccountId,
    pub listing_id: ListingId,
    pub created_at: DateTime<Utc>,
}

/// A favorite resolved to the listing it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteListing {
    pub favorite_id: FavoriteId,
    pub favorited_at: DateTime<Utc>,
    pub listing: Listing,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteView {
    pub favorite_id: FavoriteId,
    pub favorited_at: DateTime<Utc>,
    pub listing: ListingView,
}

impl From<FavoriteListing> for FavoriteView {
    fn from(f: FavoriteListing) -> Self {
        FavoriteView {
            favorite_id: f.favorite_id,
            favorited_at: f.favorited_at,
            listing: ListingView::bare(f.listing),
        }
    }
}

#[derive(sqlx::FromRow)]
struct FavoriteListingRow {
    favorite_id: FavoriteId,
    favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    listing: ListingRow,
}

impl Favorite {
    /// Insert the pair and bump the listing's counter in one statement.
    ///
    /// The unique index turns a repeat into `StoreError::Duplicate`; a missing
    /// listing trips the foreign key and becomes `StoreError::MissingReference`.
    pub async fn create(
        account_id: AccountId,
        listing_id: ListingId,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        let favorite = sqlx::query_as::<_, Favorite>(
            "WITH inserted AS (
                INSERT INTO favorites (id, account_id, listing_id, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING *
             ), bumped AS (
                UPDATE listings SET favorites_count = favorites_count + 1
                WHERE id IN (SELECT listing_id FROM inserted)
             )
             SELECT * FROM inserted",
        )
        .bind(FavoriteId::new())
        .bind(account_id)
        .bind(listing_id)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(favorite)
    }

    /// Delete the pair and decrement the counter. Returns `false` when the
    /// pair did not exist.
    pub async fn delete(
        account_id: AccountId,
        listing_id: ListingId,
        pool: &PgPool,
    ) -> Result<bool, StoreError> {
        let removed = sqlx::query_scalar::<_, i64>(
            "WITH removed AS (
                DELETE FROM favorites
                WHERE account_id = $1 AND listing_id = $2
                RETURNING listing_id
             ), dropped AS (
                UPDATE listings SET favorites_count = GREATEST(favorites_count - 1, 0)
                WHERE id IN (SELECT listing_id FROM removed)
             )
             SELECT COUNT(*) FROM removed",
        )
        .bind(account_id)
        .bind(listing_id)
        .fetch_one(pool)
        .await?;
        Ok(removed > 0)
    }

    /// Favorited listings, newest favorite first.
    pub async fn find_listings_for_account(
        account_id: AccountId,
        pool: &PgPool,
    ) -> Result<Vec<FavoriteListing>, StoreError> {
        let rows = sqlx::query_as::<_, FavoriteListingRow>(
            "SELECT f.id AS favorite_id, f.created_at AS favorited_at, l.*
             FROM favorites f
             JOIN listings l ON l.id = f.listing_id
             WHERE f.account_id = $1
             ORDER BY f.created_at DESC, f.id DESC",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(FavoriteListing {
                    favorite_id: row.favorite_id,
                    favorited_at: row.favorited_at,
                    listing: Listing::try_from(row.listing)?,
                })
            })
            .collect()
    }
}
