use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use crate::common::AppError;
use crate::domains::favorites::actions;
use crate::domains::favorites::models::{Favorite, FavoriteView};
use crate::server::app::AppState;
use crate::server::envelope::Reply;
use crate::server::middleware::Authenticated;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/:id", post(add_favorite).delete(remove_favorite))
}

async fn list_favorites(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
) -> Result<Reply<Vec<FavoriteView>>, AppError> {
    Ok(Reply::data(actions::list_favorites(&account, &state.deps).await?))
}

async fn add_favorite(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(listing_id): Path<String>,
) -> Result<Reply<Favorite>, AppError> {
    let favorite = actions::add_favorite(&account, &listing_id, &state.deps).await?;
    Ok(Reply::data(favorite)
        .with_message("Added to favorites")
        .status(StatusCode::CREATED))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(listing_id): Path<String>,
) -> Result<Reply<()>, AppError> {
    actions::remove_favorite(&account, &listing_id, &state.deps).await?;
    Ok(Reply::message("Removed from favorites"))
}
