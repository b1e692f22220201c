//! Credential checks for the login endpoint.
//!
//! The relay only needs a yes/no (or "disabled") answer for a username and
//! password, so the store sits behind [`CredentialVerifier`]. The shipped
//! implementation is the file-backed [`UserDirectory`].

pub mod directory;

use async_trait::async_trait;

pub use directory::{DirectoryError, UserDirectory};

/// A user whose credentials were accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Unknown user or wrong password. The two are not distinguished.
    #[error("Invalid credentials")]
    Invalid,

    #[error("Account disabled")]
    Disabled,

    #[error("Credential backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, CredentialError>;
}
