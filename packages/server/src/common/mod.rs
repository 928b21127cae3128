// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod pagination;
pub mod validation;

pub use auth::{Actor, Capability};
pub use entity_ids::*;
pub use errors::AppError;
pub use id::{Id, V7};
pub use pagination::{Page, PageRequest};
