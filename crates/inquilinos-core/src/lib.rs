//! Inquilinos Core Library
//!
//! Shared functionality for Inquilinos components:
//! - Configuration loading (file, environment, validation)
//! - Tracing/logging initialisation
//! - Time helpers for wire timestamps
//! - Common error types

pub mod config;
pub mod error;
pub mod time;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
