pub mod actions;
pub mod jwt;
pub mod password;
pub mod session;

pub use jwt::{Claims, JwtService};
pub use session::resolve_session;
