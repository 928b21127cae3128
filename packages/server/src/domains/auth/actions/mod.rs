//! Auth lifecycle actions.

pub mod login;
pub mod password_reset;
pub mod register;
pub mod verification;

pub use login::*;
pub use password_reset::*;
pub use register::*;
pub use verification::*;

use serde::{Deserialize, Serialize};

use crate::common::AppError;
use crate::domains::accounts::models::{Account, AccountView, OneTimeCode, CODE_TTL_MINUTES};
use crate::kernel::ServerDeps;

/// Same wording for every email-keyed request, registered or not.
pub const GENERIC_CODE_ACK: &str =
    "If an account exists for this email, a code has been sent to it.";

/// A fresh session: token for the cookie plus the sanitized account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    #[serde(skip)]
    pub token: String,
    pub account: AccountView,
}

pub(crate) fn issue_session(account: &Account, deps: &ServerDeps) -> Result<SessionGrant, AppError> {
    let token = deps.jwt_service.create_token(account, deps.clock.now())?;
    Ok(SessionGrant {
        token,
        account: AccountView::from(account),
    })
}

/// Body of endpoints that take only an email.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailInput {
    pub email: Option<String>,
}

pub(crate) fn verification_email(code: &OneTimeCode) -> (&'static str, String) {
    (
        "Verify your email address",
        format!(
            "Your verification code is {}. It expires in {} minutes.",
            code.code, CODE_TTL_MINUTES
        ),
    )
}

pub(crate) fn reset_email(code: &OneTimeCode) -> (&'static str, String) {
    (
        "Reset your password",
        format!(
            "Your password reset code is {}. It expires in {} minutes. \
             If you did not ask to reset your password, ignore this email.",
            code.code, CODE_TTL_MINUTES
        ),
    )
}
