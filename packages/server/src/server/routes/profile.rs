use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::common::AppError;
use crate::domains::accounts::actions::{self, DeleteProfileInput, ProfileUpdateInput};
use crate::domains::accounts::models::AccountView;
use crate::server::app::AppState;
use crate::server::envelope::Reply;
use crate::server::middleware::{clear_session_cookie, Authenticated};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(view_profile).put(update_profile).delete(delete_profile),
    )
}

async fn view_profile(Authenticated(account): Authenticated) -> Reply<AccountView> {
    Reply::data(actions::view_profile(&account))
}

async fn update_profile(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    body: Result<Json<ProfileUpdateInput>, JsonRejection>,
) -> Result<Reply<AccountView>, AppError> {
    let Json(input) = body?;
    let view = actions::update_profile(&account, input, &state.deps).await?;
    Ok(Reply::data(view).with_message("Profile updated"))
}

async fn delete_profile(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    body: Result<Json<DeleteProfileInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;
    actions::delete_profile(&account, input, &state.deps).await?;
    Ok((
        AppendHeaders([(SET_COOKIE, clear_session_cookie(state.secure_cookies))]),
        Reply::message("Account deleted"),
    )
        .into_response())
}
