use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::OneTimeCode;
use crate::common::AccountId;
use crate::kernel::StoreError;

// ============================================================================
// Roles
// ============================================================================

/// Kind of seller, required for (and only for) seller accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellerType {
    Owner,
    Agent,
    Builder,
}

impl std::fmt::Display for SellerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SellerType::Owner => write!(f, "Owner"),
            SellerType::Agent => write!(f, "Agent"),
            SellerType::Builder => write!(f, "Builder"),
        }
    }
}

impl std::str::FromStr for SellerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "Owner" => Ok(SellerType::Owner),
            "Agent" => Ok(SellerType::Agent),
            "Builder" => Ok(SellerType::Builder),
            _ => Err(anyhow!("Invalid seller type: {}", s)),
        }
    }
}

/// Account role. A seller always carries its seller type; buyers and admins
/// never do, so the invalid combinations cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Buyer,
    Seller { seller_type: SellerType },
    Admin,
}

/// Role without payload, used in tokens and route allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Buyer,
    Seller,
    Admin,
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleKind::Buyer => write!(f, "buyer"),
            RoleKind::Seller => write!(f, "seller"),
            RoleKind::Admin => write!(f, "admin"),
        }
    }
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Buyer => RoleKind::Buyer,
            Role::Seller { .. } => RoleKind::Seller,
            Role::Admin => RoleKind::Admin,
        }
    }

    pub fn seller_type(&self) -> Option<SellerType> {
        match self {
            Role::Seller { seller_type } => Some(*seller_type),
            _ => None,
        }
    }

    /// Rebuild a role from its stored columns.
    pub fn from_columns(role: &str, seller_type: Option<&str>) -> anyhow::Result<Self> {
        match (role, seller_type) {
            ("buyer", None) => Ok(Role::Buyer),
            ("admin", None) => Ok(Role::Admin),
            ("seller", Some(t)) => Ok(Role::Seller {
                seller_type: t.parse()?,
            }),
            (role, seller_type) => Err(anyhow!(
                "Inconsistent role columns: role={} seller_type={:?}",
                role,
                seller_type
            )),
        }
    }
}

// ============================================================================
// Account
// ============================================================================

/// A registered user.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub contact_number: String,
    pub is_verified: bool,
    pub verification: Option<OneTimeCode>,
    pub reset: Option<OneTimeCode>,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outward representation of an account. Never carries the password hash or
/// any one-time code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: RoleKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_type: Option<SellerType>,
    pub contact_number: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        AccountView {
            id: account.id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role: account.role.kind(),
            seller_type: account.role.seller_type(),
            contact_number: account.contact_number.clone(),
            is_verified: account.is_verified,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub contact_number: String,
    pub verification: OneTimeCode,
    pub created_at: DateTime<Utc>,
}

/// Self-service profile edits. `None` leaves a field unchanged; `seller_type`
/// is ignored for non-sellers.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub seller_type: Option<SellerType>,
}

impl ProfileChanges {
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(first_name) = &self.first_name {
            account.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            account.last_name = last_name.clone();
        }
        if let Some(contact_number) = &self.contact_number {
            account.contact_number = contact_number.clone();
        }
        if let (Some(seller_type), Role::Seller { .. }) = (self.seller_type, account.role) {
            account.role = Role::Seller { seller_type };
        }
    }
}

// ============================================================================
// SQL persistence
// ============================================================================

#[derive(sqlx::FromRow, Debug)]
struct AccountRow {
    id: AccountId,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
    seller_type: Option<String>,
    contact_number: String,
    is_verified: bool,
    verification_code: Option<String>,
    verification_expires_at: Option<DateTime<Utc>>,
    reset_code: Option<String>,
    reset_expires_at: Option<DateTime<Utc>>,
    password_changed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn code_from_columns(code: Option<String>, expires_at: Option<DateTime<Utc>>) -> Option<OneTimeCode> {
    match (code, expires_at) {
        (Some(code), Some(expires_at)) => Some(OneTimeCode { code, expires_at }),
        _ => None,
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = Role::from_columns(&row.role, row.seller_type.as_deref())?;
        Ok(Account {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            contact_number: row.contact_number,
            is_verified: row.is_verified,
            verification: code_from_columns(row.verification_code, row.verification_expires_at),
            reset: code_from_columns(row.reset_code, row.reset_expires_at),
            password_changed_at: row.password_changed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_account(row: Option<AccountRow>) -> Result<Option<Account>, StoreError> {
    row.map(Account::try_from).transpose()
}

impl Account {
    pub async fn insert(new: &NewAccount, pool: &PgPool) -> Result<Self, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO accounts (
                id, first_name, last_name, email, password_hash, role, seller_type,
                contact_number, verification_code, verification_expires_at,
                password_changed_at, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11, $11)
             RETURNING *",
        )
        .bind(new.id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.kind().to_string())
        .bind(new.role.seller_type().map(|t| t.to_string()))
        .bind(&new.contact_number)
        .bind(&new.verification.code)
        .bind(new.verification.expires_at)
        .bind(new.created_at)
        .fetch_one(pool)
        .await?;

        row.try_into()
    }

    pub async fn find_by_id(id: AccountId, pool: &PgPool) -> Result<Option<Self>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        into_account(row)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        into_account(row)
    }

    /// Replace the verification code of an unverified account.
    ///
    /// Returns `false` when no unverified account has this email.
    pub async fn replace_verification_code(
        email: &str,
        code: &OneTimeCode,
        pool: &PgPool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET verification_code = $2, verification_expires_at = $3, updated_at = NOW()
             WHERE email = $1 AND is_verified = false",
        )
        .bind(email)
        .bind(&code.code)
        .bind(code.expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Match and clear the verification code in one statement.
    pub async fn consume_verification_code(
        email: &str,
        code: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts
             SET is_verified = true,
                 verification_code = NULL,
                 verification_expires_at = NULL,
                 updated_at = $3
             WHERE email = $1
               AND verification_code = $2
               AND verification_expires_at > $3
             RETURNING *",
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        into_account(row)
    }

    /// Overwrite any previous reset code. Returns `false` for unknown emails.
    pub async fn replace_reset_code(
        email: &str,
        code: &OneTimeCode,
        pool: &PgPool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET reset_code = $2, reset_expires_at = $3, updated_at = NOW()
             WHERE email = $1",
        )
        .bind(email)
        .bind(&code.code)
        .bind(code.expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Match the reset code and swap the password hash in one statement.
    ///
    /// A successful reset also proves control of the address, so the account
    /// is marked verified.
    pub async fn consume_reset_code(
        email: &str,
        code: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts
             SET password_hash = $3,
                 password_changed_at = $4,
                 is_verified = true,
                 reset_code = NULL,
                 reset_expires_at = NULL,
                 updated_at = $4
             WHERE email = $1
               AND reset_code = $2
               AND reset_expires_at > $4
             RETURNING *",
        )
        .bind(email)
        .bind(code)
        .bind(new_password_hash)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        into_account(row)
    }

    pub async fn update_profile(
        id: AccountId,
        changes: &ProfileChanges,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts
             SET first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 contact_number = COALESCE($4, contact_number),
                 seller_type = CASE WHEN role = 'seller'
                                    THEN COALESCE($5, seller_type)
                                    ELSE seller_type END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.contact_number)
        .bind(changes.seller_type.map(|t| t.to_string()))
        .fetch_optional(pool)
        .await?;
        into_account(row)
    }

    /// Delete the account. Its favorites go first so the counters on other
    /// owners' listings drop with them; the rest cascades.
    pub async fn delete(id: AccountId, pool: &PgPool) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "WITH removed AS (
                DELETE FROM favorites WHERE account_id = $1
                RETURNING listing_id
             ),
             counted AS (
                UPDATE listings SET favorites_count = GREATEST(favorites_count - 1, 0)
                WHERE id IN (SELECT listing_id FROM removed)
                  AND owner_id <> $1
             )
             DELETE FROM accounts WHERE id = $1",
        )
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
