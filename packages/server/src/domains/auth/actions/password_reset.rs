use serde::Deserialize;
use tracing::{debug, info};

use crate::common::validation::{normalize_email, required};
use crate::common::AppError;
use crate::domains::accounts::models::OneTimeCode;
use crate::domains::auth::password::{check_strength, hash_password};
use crate::kernel::ServerDeps;

use super::{issue_session, reset_email, EmailInput, SessionGrant};

/// Issue a reset code, overwriting any earlier one.
///
/// Answers identically whether or not the email is registered.
pub async fn forgot_password(input: EmailInput, deps: &ServerDeps) -> Result<(), AppError> {
    let email = normalize_email(&required(input.email, "email")?);
    let code = OneTimeCode::issue(deps.clock.now());

    if deps.accounts.replace_reset_code(&email, code.clone()).await? {
        let (subject, body) = reset_email(&code);
        deps.notify(&email, subject, &body).await;
    } else {
        debug!("Password reset requested for unknown email");
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub email: Option<String>,
    pub code: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Swap the password using a reset code and open a fresh session.
///
/// The new password is checked before the code is touched, so a rejected
/// password leaves the code usable. Sessions issued before the reset stop
/// resolving.
pub async fn reset_password(
    input: ResetPasswordInput,
    deps: &ServerDeps,
) -> Result<SessionGrant, AppError> {
    let email = normalize_email(&required(input.email, "email")?);
    let code = required(input.code, "code")?;
    let new_password = input
        .new_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("newPassword is required"))?;
    let confirm_password = input
        .confirm_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("confirmPassword is required"))?;

    check_strength(&new_password)?;
    if new_password != confirm_password {
        return Err(AppError::Mismatch);
    }

    let new_hash = hash_password(&new_password)?;
    let account = deps
        .accounts
        .consume_reset_code(&email, &code, &new_hash, deps.clock.now())
        .await?
        .ok_or(AppError::InvalidOrExpiredCode)?;

    info!(account_id = %account.id, "Password reset");
    issue_session(&account, deps)
}
