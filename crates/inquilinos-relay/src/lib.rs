//! Inquilinos Relay Server Library
//!
//! Core functionality for the tenant access relay:
//! - Bearer token issuance and validation (HS512 JWT)
//! - Credential checks against the user directory
//! - Lock command relay to the smart-lock vendor API
//! - HTTP endpoints (login, open lock, health)

pub mod auth;
pub mod server;
pub mod users;
pub mod vendor;
