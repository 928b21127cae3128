pub mod actions;
pub mod geo;
pub mod models;
pub mod query;
