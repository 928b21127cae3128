// Listings Marketplace - API Core
//
// Backend for a property listings marketplace: accounts with email OTP
// verification, JWT sessions, listing CRUD with a filtered feed, and favorites.
// Domain logic lives in domains/*/actions behind the service traits in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
