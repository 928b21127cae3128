use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::debug;

use crate::common::AppError;
use crate::domains::accounts::models::Account;
use crate::domains::auth::jwt::SESSION_TTL_DAYS;
use crate::domains::auth::resolve_session;
use crate::server::app::AppState;

pub const SESSION_COOKIE: &str = "token";

/// Session token from the `token` cookie, else from `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// The live account behind a valid session. Rejects with `Unauthenticated`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Account);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers);
        if token.is_none() {
            debug!(path = %parts.uri.path(), "No session token");
        }
        let account = resolve_session(&state.deps, token.as_deref()).await?;
        Ok(Authenticated(account))
    }
}

/// `Set-Cookie` value carrying a fresh session.
pub fn session_cookie(token: &str, secure: bool) -> String {
    cookie(token, SESSION_TTL_DAYS * 24 * 60 * 60, secure)
}

/// `Set-Cookie` value that expires the session immediately.
pub fn clear_session_cookie(secure: bool) -> String {
    cookie("", 0, secure)
}

fn cookie(value: &str, max_age: i64, secure: bool) -> String {
    let secure = if secure { " Secure;" } else { "" };
    format!(
        "{}={}; HttpOnly;{} SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE, value, secure, max_age
    )
}
