//! Access control.
//!
//! Authorization runs after the session has been resolved to a live account:
//!
//! ```rust,ignore
//! use crate::common::auth::{Actor, Capability, LISTING_PUBLISHERS};
//!
//! Actor::from_account(&account)
//!     .can(Capability::HoldRole(LISTING_PUBLISHERS))
//!     .check()?;
//!
//! Actor::from_account(&account)
//!     .can(Capability::ManageListing { owner_id: listing.owner_id })
//!     .check()?;
//! ```

mod builder;
mod capability;

pub use builder::{Actor, CapabilityBuilder};
pub use capability::{Capability, LISTING_PUBLISHERS};
