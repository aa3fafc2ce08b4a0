//! Authentication primitives shared by the HTTP layer and the domains.
//!
//! Session handling itself lives outside this crate: a request either carries a
//! bearer token that resolves to a username, or it is anonymous.

mod errors;
mod jwt;

pub use errors::AuthError;
pub use jwt::{Claims, JwtService};
