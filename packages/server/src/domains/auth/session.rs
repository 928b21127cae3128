//! Session token → live account.

use tracing::debug;

use super::jwt::{Claims, JwtService};
use crate::common::AppError;
use crate::domains::accounts::models::Account;
use crate::kernel::ServerDeps;

/// Verify a raw token. Any failure is `Unauthenticated`.
pub fn decode_session(jwt: &JwtService, token: &str) -> Result<Claims, AppError> {
    jwt.verify_token(token).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        AppError::Unauthenticated
    })
}

/// A token minted before the account's last password change is stale.
pub fn is_stale(claims: &Claims, account: &Account) -> bool {
    account.password_changed_at.timestamp_millis() > claims.pwd_at
}

/// Resolve an optional raw token to the live account record.
pub async fn resolve_session(deps: &ServerDeps, token: Option<&str>) -> Result<Account, AppError> {
    let token = token.ok_or(AppError::Unauthenticated)?;
    let claims = decode_session(&deps.jwt_service, token)?;

    let account = deps
        .accounts
        .find_account(claims.account_id)
        .await?
        .ok_or_else(|| {
            debug!(account_id = %claims.account_id, "Session for missing account");
            AppError::Unauthenticated
        })?;

    if is_stale(&claims, &account) {
        debug!(account_id = %account.id, "Session predates password change");
        return Err(AppError::Unauthenticated);
    }

    Ok(account)
}
