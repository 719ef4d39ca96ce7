//! Authentication module
//!
//! Bearer JWT validation for user-scoped routes.

mod jwt;
mod middleware;

pub use jwt::{Claims, JwtService};
pub use middleware::AuthUser;
