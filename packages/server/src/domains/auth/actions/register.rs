use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::validation::{
    is_valid_email, normalize_email, required, validate_contact_number, validate_name,
};
use crate::common::{AccountId, AppError};
use crate::domains::accounts::models::{NewAccount, OneTimeCode, Role, SellerType};
use crate::domains::auth::password::{check_strength, hash_password};
use crate::kernel::{ServerDeps, StoreError};

use super::verification_email;

/// Registration form as posted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub contact_number: Option<String>,
    /// `buy` or `sell`; absent means `buy`.
    pub intent: Option<String>,
    /// Required when `intent` is `sell`.
    pub seller_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub contact_number: String,
    pub role: Role,
}

impl RegisterInput {
    pub fn validate(self) -> Result<ValidatedRegistration, AppError> {
        let first_name = required(self.first_name, "firstName")?;
        let last_name = required(self.last_name, "lastName")?;
        let email = required(self.email, "email")?;
        // Passwords are taken verbatim; only presence is checked here.
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("password is required"))?;
        let confirm_password = self
            .confirm_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("confirmPassword is required"))?;
        let contact_number = required(self.contact_number, "contactNumber")?;

        let role = match self
            .intent
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .unwrap_or("buy")
        {
            "buy" => Role::Buyer,
            "sell" => {
                let seller_type = required(self.seller_type, "sellerType")?;
                let seller_type: SellerType = seller_type.parse().map_err(|_| {
                    AppError::validation("sellerType must be one of Owner, Agent, Builder")
                })?;
                Role::Seller { seller_type }
            }
            _ => return Err(AppError::validation("intent must be buy or sell")),
        };

        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("email must be a valid email address"));
        }
        validate_contact_number(&contact_number)?;
        validate_name(&first_name, "firstName")?;
        validate_name(&last_name, "lastName")?;

        check_strength(&password)?;
        if password != confirm_password {
            return Err(AppError::Mismatch);
        }

        Ok(ValidatedRegistration {
            first_name,
            last_name,
            email,
            password,
            contact_number,
            role,
        })
    }
}

/// Non-secret acknowledgment. Never carries the code or a token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationAck {
    pub email: String,
}

/// Create an unverified account and email it a verification code.
pub async fn register(input: RegisterInput, deps: &ServerDeps) -> Result<RegistrationAck, AppError> {
    let form = input.validate()?;
    let now = deps.clock.now();
    let verification = OneTimeCode::issue(now);

    let new_account = NewAccount {
        id: AccountId::new(),
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email.clone(),
        password_hash: hash_password(&form.password)?,
        role: form.role,
        contact_number: form.contact_number,
        verification: verification.clone(),
        created_at: now,
    };

    let account = deps
        .accounts
        .insert_account(new_account)
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            other => other.into(),
        })?;

    info!(account_id = %account.id, role = %account.role.kind(), "Account registered");

    let (subject, body) = verification_email(&verification);
    deps.notify(&account.email, subject, &body).await;

    Ok(RegistrationAck {
        email: account.email,
    })
}
