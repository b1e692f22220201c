//! Password hashing and verification using argon2id.
//!
//! Stored hashes are PHC strings (`$argon2id$v=19$...`). They are parsed
//! once when the user directory is loaded, so a corrupt entry fails startup
//! instead of a login.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

#[derive(Debug, thiserror::Error)]
#[error("Password hash error: {0}")]
pub struct PasswordError(String);

impl From<argon2::password_hash::Error> for PasswordError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self(e.to_string())
    }
}

/// A validated PHC hash string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredHash(String);

impl StoredHash {
    /// Accept `phc` only if it parses as a PHC hash string.
    pub fn parse(phc: &str) -> Result<Self, PasswordError> {
        PasswordHash::new(phc)?;
        Ok(Self(phc.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check `password` against this hash. A mismatch is `false`, not an error.
    pub fn matches(&self, password: &str) -> bool {
        PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

/// Hash a password with argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<StoredHash, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(StoredHash(hash.to_string()))
}
