//! Typed ID definitions for the marketplace entities.

pub use super::id::{Id, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Account entities (buyers, sellers, admins).
pub struct Account;

/// Marker type for Listing entities (property listings).
pub struct Listing;

/// Marker type for Favorite entities (account ↔ listing bookmarks).
pub struct Favorite;

// ============================================================================
// Type aliases
// ============================================================================

pub type AccountId = Id<Account>;

pub type ListingId = Id<Listing>;

pub type FavoriteId = Id<Favorite>;
