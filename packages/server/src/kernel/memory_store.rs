//! In-memory implementation of the store traits.
//!
//! Backs the integration tests. One mutex guards all three collections, so
//! each trait call is atomic the same way a single SQL statement is, and the
//! cascades mirror the foreign keys in the migrations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::traits::{
    BaseAccountStore, BaseClock, BaseFavoriteStore, BaseListingStore, StoreError, StoreResult,
};
use crate::common::{AccountId, FavoriteId, ListingId};
use crate::domains::accounts::models::{Account, NewAccount, OneTimeCode, ProfileChanges};
use crate::domains::favorites::models::{Favorite, FavoriteListing};
use crate::domains::listings::models::{Listing, ListingChanges, ListingWithOwner, NewListing};
use crate::domains::listings::query::FeedQuery;

#[derive(Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    listings: HashMap<ListingId, Listing>,
    favorites: Vec<Favorite>,
}

impl State {
    fn account_by_email_mut(&mut self, email: &str) -> Option<&mut Account> {
        self.accounts.values_mut().find(|a| a.email == email)
    }

    fn with_owner(&self, listing: &Listing) -> Option<ListingWithOwner> {
        let owner = self.accounts.get(&listing.owner_id)?;
        Some(ListingWithOwner {
            listing: listing.clone(),
            owner_first_name: owner.first_name.clone(),
            owner_last_name: owner.last_name.clone(),
            owner_contact_number: owner.contact_number.clone(),
        })
    }

    /// Drop favorites matching `pred`, keeping listing counters in step.
    fn remove_favorites_where(&mut self, pred: impl Fn(&Favorite) -> bool) {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.favorites.drain(..).partition(|f| pred(f));
        self.favorites = kept;
        for favorite in removed {
            if let Some(listing) = self.listings.get_mut(&favorite.listing_id) {
                listing.favorites_count = (listing.favorites_count - 1).max(0);
            }
        }
    }

    fn remove_listing(&mut self, id: ListingId) -> bool {
        if self.listings.remove(&id).is_none() {
            return false;
        }
        self.favorites.retain(|f| f.listing_id != id);
        true
    }
}

pub struct MemoryStore {
    state: Mutex<State>,
    clock: Arc<dyn BaseClock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn BaseClock>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BaseAccountStore for MemoryStore {
    async fn insert_account(&self, new: NewAccount) -> StoreResult<Account> {
        let mut state = self.state();
        if state.accounts.values().any(|a| a.email == new.email) {
            return Err(StoreError::Duplicate("Email"));
        }
        let account = Account {
            id: new.id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            contact_number: new.contact_number,
            is_verified: false,
            verification: Some(new.verification),
            reset: None,
            password_changed_at: new.created_at,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.state().accounts.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .state()
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn replace_verification_code(&self, email: &str, code: OneTimeCode) -> StoreResult<bool> {
        let now = self.clock.now();
        let mut state = self.state();
        match state.account_by_email_mut(email) {
            Some(account) if !account.is_verified => {
                account.verification = Some(code);
                account.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn consume_verification_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Account>> {
        let mut state = self.state();
        let Some(account) = state.account_by_email_mut(email) else {
            return Ok(None);
        };
        match &account.verification {
            Some(stored) if stored.accepts(code, now) => {
                account.is_verified = true;
                account.verification = None;
                account.updated_at = now;
                Ok(Some(account.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn replace_reset_code(&self, email: &str, code: OneTimeCode) -> StoreResult<bool> {
        let now = self.clock.now();
        let mut state = self.state();
        match state.account_by_email_mut(email) {
            Some(account) => {
                account.reset = Some(code);
                account.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn consume_reset_code(
        &self,
        email: &str,
        code: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Account>> {
        let mut state = self.state();
        let Some(account) = state.account_by_email_mut(email) else {
            return Ok(None);
        };
        match &account.reset {
            Some(stored) if stored.accepts(code, now) => {
                account.password_hash = new_password_hash.to_string();
                account.password_changed_at = now;
                account.is_verified = true;
                account.reset = None;
                account.updated_at = now;
                Ok(Some(account.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_profile(
        &self,
        id: AccountId,
        changes: ProfileChanges,
    ) -> StoreResult<Option<Account>> {
        let now = self.clock.now();
        let mut state = self.state();
        let Some(account) = state.accounts.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(account);
        account.updated_at = now;
        Ok(Some(account.clone()))
    }

    async fn delete_account(&self, id: AccountId) -> StoreResult<bool> {
        let mut state = self.state();
        if state.accounts.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<ListingId> = state
            .listings
            .values()
            .filter(|l| l.owner_id == id)
            .map(|l| l.id)
            .collect();
        for listing_id in owned {
            state.remove_listing(listing_id);
        }
        state.remove_favorites_where(|f| f.account_id == id);
        Ok(true)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BaseListingStore for MemoryStore {
    async fn insert_listing(&self, new: NewListing) -> StoreResult<Listing> {
        let mut state = self.state();
        if !state.accounts.contains_key(&new.owner_id) {
            return Err(StoreError::MissingReference("Account"));
        }
        let listing = new.into_listing();
        state.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn find_listing(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        Ok(self.state().listings.get(&id).cloned())
    }

    async fn record_listing_view(&self, id: ListingId) -> StoreResult<Option<ListingWithOwner>> {
        let mut state = self.state();
        let Some(listing) = state.listings.get_mut(&id) else {
            return Ok(None);
        };
        listing.view_count += 1;
        let listing = listing.clone();
        Ok(state.with_owner(&listing))
    }

    async fn search_listings(
        &self,
        query: &FeedQuery,
    ) -> StoreResult<(Vec<ListingWithOwner>, i64)> {
        let state = self.state();
        let mut matches: Vec<&Listing> = state
            .listings
            .values()
            .filter(|l| state.accounts.contains_key(&l.owner_id) && query.matches(l))
            .collect();
        matches.sort_by(|a, b| query.compare(a, b));

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit() as usize)
            .filter_map(|l| state.with_owner(l))
            .collect();
        Ok((page, total))
    }

    async fn find_listings_by_owner(&self, owner_id: AccountId) -> StoreResult<Vec<Listing>> {
        let state = self.state();
        let mut owned: Vec<Listing> = state
            .listings
            .values()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn update_listing(
        &self,
        id: ListingId,
        changes: &ListingChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Listing>> {
        let mut state = self.state();
        let Some(stored) = state.listings.get_mut(&id) else {
            return Ok(None);
        };
        changes.clone().apply_to(stored);
        stored.updated_at = now;
        Ok(Some(stored.clone()))
    }

    async fn delete_listing(&self, id: ListingId) -> StoreResult<bool> {
        Ok(self.state().remove_listing(id))
    }

    async fn delete_listings_by_owner(&self, owner_id: AccountId) -> StoreResult<u64> {
        let mut state = self.state();
        let owned: Vec<ListingId> = state
            .listings
            .values()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.id)
            .collect();
        for id in &owned {
            state.remove_listing(*id);
        }
        Ok(owned.len() as u64)
    }
}

#[async_trait]
impl BaseFavoriteStore for MemoryStore {
    async fn add_favorite(
        &self,
        account_id: AccountId,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> StoreResult<Favorite> {
        let mut state = self.state();
        if !state.accounts.contains_key(&account_id) {
            return Err(StoreError::MissingReference("Account"));
        }
        if !state.listings.contains_key(&listing_id) {
            return Err(StoreError::MissingReference("Listing"));
        }
        if state
            .favorites
            .iter()
            .any(|f| f.account_id == account_id && f.listing_id == listing_id)
        {
            return Err(StoreError::Duplicate("Favorite"));
        }

        let favorite = Favorite {
            id: FavoriteId::new(),
            account_id,
            listing_id,
            created_at: now,
        };
        state.favorites.push(favorite.clone());
        if let Some(listing) = state.listings.get_mut(&listing_id) {
            listing.favorites_count += 1;
        }
        Ok(favorite)
    }

    async fn remove_favorite(
        &self,
        account_id: AccountId,
        listing_id: ListingId,
    ) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.favorites.len();
        state.remove_favorites_where(|f| f.account_id == account_id && f.listing_id == listing_id);
        Ok(state.favorites.len() < before)
    }

    async fn list_favorites(&self, account_id: AccountId) -> StoreResult<Vec<FavoriteListing>> {
        let state = self.state();
        let mut favorites: Vec<&Favorite> = state
            .favorites
            .iter()
            .filter(|f| f.account_id == account_id)
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        Ok(favorites
            .into_iter()
            .filter_map(|f| {
                state.listings.get(&f.listing_id).map(|listing| FavoriteListing {
                    favorite_id: f.id,
                    favorited_at: f.created_at,
                    listing: listing.clone(),
                })
            })
            .collect())
    }
}
