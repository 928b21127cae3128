use serde::Deserialize;
use tracing::info;

use crate::common::validation::{non_blank, validate_contact_number, validate_name};
use crate::common::AppError;
use crate::domains::accounts::models::{Account, AccountView, ProfileChanges, SellerType};
use crate::domains::auth::password::verify_password;
use crate::kernel::ServerDeps;

/// Profile edit as posted. Email and role are not editable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub seller_type: Option<String>,
}

impl ProfileUpdateInput {
    /// Present fields must be valid; `sellerType` is dropped for non-sellers.
    pub fn validate(self, account: &Account) -> Result<ProfileChanges, AppError> {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.first_name) {
            return Err(AppError::validation("firstName cannot be empty"));
        }
        if blank(&self.last_name) {
            return Err(AppError::validation("lastName cannot be empty"));
        }

        let first_name = non_blank(self.first_name);
        let last_name = non_blank(self.last_name);
        let contact_number = non_blank(self.contact_number);

        if let Some(first_name) = &first_name {
            validate_name(first_name, "firstName")?;
        }
        if let Some(last_name) = &last_name {
            validate_name(last_name, "lastName")?;
        }
        if let Some(contact_number) = &contact_number {
            validate_contact_number(contact_number)?;
        }

        let seller_type = match (non_blank(self.seller_type), account.role.seller_type()) {
            (Some(raw), Some(_)) => Some(raw.parse::<SellerType>().map_err(|_| {
                AppError::validation("sellerType must be one of Owner, Agent, Builder")
            })?),
            _ => None,
        };

        Ok(ProfileChanges {
            first_name,
            last_name,
            contact_number,
            seller_type,
        })
    }
}

pub fn view_profile(account: &Account) -> AccountView {
    AccountView::from(account)
}

pub async fn update_profile(
    account: &Account,
    input: ProfileUpdateInput,
    deps: &ServerDeps,
) -> Result<AccountView, AppError> {
    let changes = input.validate(account)?;
    let updated = deps
        .accounts
        .update_profile(account.id, changes)
        .await?
        .ok_or(AppError::NotFound("Account"))?;

    info!(account_id = %updated.id, "Profile updated");
    Ok(AccountView::from(&updated))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteProfileInput {
    pub password: Option<String>,
}

/// Permanently delete the caller and everything they listed.
pub async fn delete_profile(
    account: &Account,
    input: DeleteProfileInput,
    deps: &ServerDeps,
) -> Result<(), AppError> {
    let password = input
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            AppError::validation("Password confirmation is required to delete your account")
        })?;

    if !verify_password(&account.password_hash, &password) {
        return Err(AppError::InvalidCredentials);
    }

    let removed = deps.listings.delete_listings_by_owner(account.id).await?;
    deps.accounts.delete_account(account.id).await?;

    info!(account_id = %account.id, listings_removed = removed, "Account deleted");
    Ok(())
}
