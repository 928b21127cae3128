use crate::common::AccountId;
use crate::domains::accounts::models::RoleKind;

/// Roles allowed to publish listings.
pub const LISTING_PUBLISHERS: &[RoleKind] = &[RoleKind::Seller, RoleKind::Admin];

/// What an actor is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<'a> {
    /// Hold one of the listed roles (route-declared allow-list).
    HoldRole(&'a [RoleKind]),

    /// Modify or remove a listing owned by the given account.
    ManageListing { owner_id: AccountId },
}
