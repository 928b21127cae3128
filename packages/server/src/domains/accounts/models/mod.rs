pub mod account;
pub mod one_time_code;

pub use account::*;
pub use one_time_code::*;
