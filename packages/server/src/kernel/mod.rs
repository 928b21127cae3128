//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod memory_store;
pub mod postgres_store;
pub mod test_dependencies;
pub mod traits;

pub use deps::{CloudinaryAdapter, MailerAdapter, ServerDeps};
pub use memory_store::MemoryStore;
pub use postgres_store::PgStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
