//! Authentication: admin sessions and identity-provider customers

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use extractor::{Customer, OptionalCustomer};
pub use jwt::{AdminClaims, AuthKeys, CustomerClaims};
pub use middleware::require_admin;
