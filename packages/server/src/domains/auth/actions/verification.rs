use serde::Deserialize;
use tracing::{debug, info};

use crate::common::validation::{normalize_email, required};
use crate::common::AppError;
use crate::domains::accounts::models::OneTimeCode;
use crate::kernel::ServerDeps;

use super::{issue_session, verification_email, EmailInput, SessionGrant};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpInput {
    pub email: Option<String>,
    pub code: Option<String>,
}

/// Consume the verification code and open a session.
///
/// Unknown email, wrong code, expired code and reused code all fail the same
/// way.
pub async fn verify_email(input: VerifyOtpInput, deps: &ServerDeps) -> Result<SessionGrant, AppError> {
    let email = normalize_email(&required(input.email, "email")?);
    let code = required(input.code, "code")?;

    let account = deps
        .accounts
        .consume_verification_code(&email, &code, deps.clock.now())
        .await?
        .ok_or(AppError::InvalidOrExpiredCode)?;

    info!(account_id = %account.id, "Email verified");
    issue_session(&account, deps)
}

/// Replace and resend the verification code of an unverified account.
///
/// Answers identically whether or not such an account exists.
pub async fn resend_verification_code(input: EmailInput, deps: &ServerDeps) -> Result<(), AppError> {
    let email = normalize_email(&required(input.email, "email")?);
    let code = OneTimeCode::issue(deps.clock.now());

    if deps.accounts.replace_verification_code(&email, code.clone()).await? {
        let (subject, body) = verification_email(&code);
        deps.notify(&email, subject, &body).await;
    } else {
        debug!("Resend requested for unknown or already verified email");
    }
    Ok(())
}
