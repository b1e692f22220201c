//! Authentication module for the Inquilinos relay.
//!
//! Provides bearer token management and password hashing.

pub mod claims;
pub mod jwt;
pub mod password;

pub use claims::Claims;
pub use jwt::{JwtManager, TokenError};
