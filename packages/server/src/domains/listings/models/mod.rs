pub mod input;
pub mod listing;

pub use input::*;
pub use listing::*;
