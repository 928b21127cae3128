use serde::Deserialize;
use tracing::info;

use crate::common::validation::{normalize_email, required};
use crate::common::AppError;
use crate::domains::auth::password::{verify_against_dummy, verify_password};
use crate::kernel::ServerDeps;

use super::{issue_session, SessionGrant};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Check credentials and open a session.
///
/// Unknown email and wrong password are indistinguishable. The unverified
/// check only runs once the password is known to be right.
pub async fn login(input: LoginInput, deps: &ServerDeps) -> Result<SessionGrant, AppError> {
    let email = normalize_email(&required(input.email, "email")?);
    let password = input
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("password is required"))?;

    let account = match deps.accounts.find_account_by_email(&email).await? {
        Some(account) => account,
        None => {
            verify_against_dummy(&password);
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&account.password_hash, &password) {
        return Err(AppError::InvalidCredentials);
    }

    if !account.is_verified {
        return Err(AppError::forbidden("Email address has not been verified"));
    }

    info!(account_id = %account.id, "Login succeeded");
    issue_session(&account, deps)
}
