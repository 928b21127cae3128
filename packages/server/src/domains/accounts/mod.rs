pub mod actions;
pub mod models;
