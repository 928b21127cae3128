// HTTP routes
pub mod auth;
pub mod favorites;
pub mod health;
pub mod profile;
pub mod properties;

pub use health::*;
