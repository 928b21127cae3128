//! PostgreSQL implementation of the store traits.
//!
//! Thin delegation to the SQL on each model; every mutation is one statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::{BaseAccountStore, BaseFavoriteStore, BaseListingStore, StoreResult};
use crate::common::{AccountId, ListingId};
use crate::domains::accounts::models::{Account, NewAccount, OneTimeCode, ProfileChanges};
use crate::domains::favorites::models::{Favorite, FavoriteListing};
use crate::domains::listings::models::{Listing, ListingChanges, ListingWithOwner, NewListing};
use crate::domains::listings::query::FeedQuery;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseAccountStore for PgStore {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        Account::insert(&account, &self.pool).await
    }

    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Account::find_by_id(id, &self.pool).await
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Account::find_by_email(email, &self.pool).await
    }

    async fn replace_verification_code(&self, email: &str, code: OneTimeCode) -> StoreResult<bool> {
        Account::replace_verification_code(email, &code, &self.pool).await
    }

    async fn consume_verification_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Account>> {
        Account::consume_verification_code(email, code, now, &self.pool).await
    }

    async fn replace_reset_code(&self, email: &str, code: OneTimeCode) -> StoreResult<bool> {
        Account::replace_reset_code(email, &code, &self.pool).await
    }

    async fn consume_reset_code(
        &self,
        email: &str,
        code: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Account>> {
        Account::consume_reset_code(email, code, new_password_hash, now, &self.pool).await
    }

    async fn update_profile(
        &self,
        id: AccountId,
        changes: ProfileChanges,
    ) -> StoreResult<Option<Account>> {
        Account::update_profile(id, &changes, &self.pool).await
    }

    async fn delete_account(&self, id: AccountId) -> StoreResult<bool> {
        Account::delete(id, &self.pool).await
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BaseListingStore for PgStore {
    async fn insert_listing(&self, listing: NewListing) -> StoreResult<Listing> {
        Listing::insert(&listing, &self.pool).await
    }

    async fn find_listing(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        Listing::find_by_id(id, &self.pool).await
    }

    async fn record_listing_view(&self, id: ListingId) -> StoreResult<Option<ListingWithOwner>> {
        Listing::record_view(id, &self.pool).await
    }

    async fn search_listings(
        &self,
        query: &FeedQuery,
    ) -> StoreResult<(Vec<ListingWithOwner>, i64)> {
        Listing::search(query, &self.pool).await
    }

    async fn find_listings_by_owner(&self, owner_id: AccountId) -> StoreResult<Vec<Listing>> {
        Listing::find_by_owner(owner_id, &self.pool).await
    }

    async fn update_listing(
        &self,
        id: ListingId,
        changes: &ListingChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Listing>> {
        Listing::update(id, changes, now, &self.pool).await
    }

    async fn delete_listing(&self, id: ListingId) -> StoreResult<bool> {
        Listing::delete(id, &self.pool).await
    }

    async fn delete_listings_by_owner(&self, owner_id: AccountId) -> StoreResult<u64> {
        Listing::delete_by_owner(owner_id, &self.pool).await
    }
}

#[async_trait]
impl BaseFavoriteStore for PgStore {
    async fn add_favorite(
        &self,
        account_id: AccountId,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> StoreResult<Favorite> {
        Favorite::create(account_id, listing_id, now, &self.pool).await
    }

    async fn remove_favorite(
        &self,
        account_id: AccountId,
        listing_id: ListingId,
    ) -> StoreResult<bool> {
        Favorite::delete(account_id, listing_id, &self.pool).await
    }

    async fn list_favorites(&self, account_id: AccountId) -> StoreResult<Vec<FavoriteListing>> {
        Favorite::find_listings_for_account(account_id, &self.pool).await
    }
}
