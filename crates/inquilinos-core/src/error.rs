//! Error types for Inquilinos core library.

use thiserror::Error;

/// Result type alias using the core `Error`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing a value or holds an invalid one.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracing subscriber could not be installed.
    #[error("Tracing setup failed: {0}")]
    Tracing(String),
}
