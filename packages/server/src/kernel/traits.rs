// Trait definitions for dependency injection
//
// Infrastructure seams only. Domain rules (who may do what, what a valid
// listing is) live in domain actions that call these traits.
//
// Naming convention: Base* for trait names (e.g., BaseAccountStore, BaseEmailService)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::common::{AccountId, ListingId};
use crate::domains::accounts::models::{Account, NewAccount, OneTimeCode, ProfileChanges};
use crate::domains::favorites::models::{Favorite, FavoriteListing};
use crate::domains::listings::models::{Listing, ListingChanges, ListingWithOwner, NewListing};
use crate::domains::listings::query::FeedQuery;

// =============================================================================
// Store errors
// =============================================================================

/// Failures a store reports. Constraint violations are surfaced as their own
/// variants so callers can answer 409/404 instead of 500.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique key already holds this value.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    /// A foreign key points at a row that does not exist.
    #[error("{0} does not exist")]
    MissingReference(&'static str),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    return StoreError::Duplicate(match db.constraint() {
                        Some("accounts_email_key") => "Email",
                        Some("favorites_account_listing_key") => "Favorite",
                        _ => "Record",
                    });
                }
                // foreign_key_violation
                Some("23503") => {
                    return StoreError::MissingReference(match db.constraint() {
                        Some("favorites_listing_id_fkey") => "Listing",
                        _ => "Account",
                    });
                }
                _ => {}
            }
        }
        StoreError::Backend(err.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// =============================================================================
// Credential Store
// =============================================================================

#[async_trait]
pub trait BaseAccountStore: Send + Sync {
    /// Fails with `StoreError::Duplicate("Email")` when the email is taken.
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account>;

    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Replace the verification code of an unverified account. `false` when
    /// no unverified account has this email.
    async fn replace_verification_code(&self, email: &str, code: OneTimeCode) -> StoreResult<bool>;

    /// Atomically match email + code + unexpired, mark verified, clear the code.
    async fn consume_verification_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Account>>;

    /// Overwrite any previous reset code. `false` for unknown emails.
    async fn replace_reset_code(&self, email: &str, code: OneTimeCode) -> StoreResult<bool>;

    /// Atomically match email + reset code + unexpired, swap the password
    /// hash, stamp `password_changed_at = now`, mark verified, clear the code.
    async fn consume_reset_code(
        &self,
        email: &str,
        code: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Account>>;

    async fn update_profile(
        &self,
        id: AccountId,
        changes: ProfileChanges,
    ) -> StoreResult<Option<Account>>;

    async fn delete_account(&self, id: AccountId) -> StoreResult<bool>;

    /// Cheap reachability check for the health endpoint.
    async fn ping(&self) -> StoreResult<()>;
}

// =============================================================================
// Listing Store
// =============================================================================

#[async_trait]
pub trait BaseListingStore: Send + Sync {
    async fn insert_listing(&self, listing: NewListing) -> StoreResult<Listing>;

    async fn find_listing(&self, id: ListingId) -> StoreResult<Option<Listing>>;

    /// Increment the view counter and return the updated listing with its
    /// owner, as one atomic operation.
    async fn record_listing_view(&self, id: ListingId) -> StoreResult<Option<ListingWithOwner>>;

    /// One page of matching listings and the total match count.
    async fn search_listings(&self, query: &FeedQuery)
        -> StoreResult<(Vec<ListingWithOwner>, i64)>;

    /// Newest first.
    async fn find_listings_by_owner(&self, owner_id: AccountId) -> StoreResult<Vec<Listing>>;

    /// Apply owner edits as one atomic step. Counters are untouched.
    async fn update_listing(
        &self,
        id: ListingId,
        changes: &ListingChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Listing>>;

    async fn delete_listing(&self, id: ListingId) -> StoreResult<bool>;

    async fn delete_listings_by_owner(&self, owner_id: AccountId) -> StoreResult<u64>;
}

// =============================================================================
// Favorites Ledger
// =============================================================================

#[async_trait]
pub trait BaseFavoriteStore: Send + Sync {
    /// Create the pair and increment the listing's favorites counter together.
    async fn add_favorite(
        &self,
        account_id: AccountId,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> StoreResult<Favorite>;

    /// Delete the pair and decrement the counter. `false` when absent.
    async fn remove_favorite(&self, account_id: AccountId, listing_id: ListingId)
        -> StoreResult<bool>;

    /// Newest favorite first.
    async fn list_favorites(&self, account_id: AccountId) -> StoreResult<Vec<FavoriteListing>>;
}

// =============================================================================
// Email Service Trait (Infrastructure - OTP delivery)
// =============================================================================

#[async_trait]
pub trait BaseEmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

// =============================================================================
// Image Storage Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseImageStorage: Send + Sync {
    /// Upload one image and return its public URL.
    async fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}

// =============================================================================
// Clock
// =============================================================================

pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
