//! File-backed user directory.
//!
//! The file is a JSON array:
//!
//! ```json
//! [
//!   { "username": "alice", "password_hash": "$argon2id$v=19$...", "enabled": true }
//! ]
//! ```
//!
//! `enabled` defaults to `true`. Hashes come from `inquilinos-relay hash-password`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{AuthenticatedUser, CredentialError, CredentialVerifier};
use crate::auth::password::{self, StoredHash};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Failed to read user directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse user directory: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("User directory entry with empty username")]
    EmptyUsername,

    #[error("Duplicate user {0} in directory")]
    DuplicateUser(String),

    #[error("Invalid password hash for user {username}: {reason}")]
    InvalidHash { username: String, reason: String },
}

#[derive(Deserialize)]
struct UserEntry {
    username: String,
    password_hash: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    hash: StoredHash,
    enabled: bool,
}

/// In-memory user table, read-only after load.
#[derive(Debug)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
    // Checked for unknown usernames so they cost the same as a wrong password.
    decoy: StoredHash,
}

impl UserDirectory {
    pub fn from_file(path: &Path) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::from_json(&content)?;
        info!(path = %path.display(), users = directory.len(), "User directory loaded");
        Ok(directory)
    }

    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let entries: Vec<UserEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<UserEntry>) -> Result<Self, DirectoryError> {
        let mut users = HashMap::with_capacity(entries.len());
        for entry in entries {
            let username = entry.username.trim().to_string();
            if username.is_empty() {
                return Err(DirectoryError::EmptyUsername);
            }
            let hash = StoredHash::parse(&entry.password_hash).map_err(|e| {
                DirectoryError::InvalidHash {
                    username: username.clone(),
                    reason: e.to_string(),
                }
            })?;
            if users.contains_key(&username) {
                return Err(DirectoryError::DuplicateUser(username));
            }
            users.insert(
                username.clone(),
                UserRecord {
                    username,
                    hash,
                    enabled: entry.enabled,
                },
            );
        }

        let decoy = password::hash_password(&uuid::Uuid::new_v4().to_string()).map_err(|e| {
            DirectoryError::InvalidHash {
                username: "<decoy>".into(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self { users, decoy })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for UserDirectory {
    async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, CredentialError> {
        let record = self.users.get(username).cloned();
        let hash = record
            .as_ref()
            .map_or_else(|| self.decoy.clone(), |r| r.hash.clone());
        let password = password.to_string();

        // argon2 is deliberately slow; keep it off the async workers.
        let matches = tokio::task::spawn_blocking(move || hash.matches(&password))
            .await
            .map_err(|e| CredentialError::Backend(e.to_string()))?;

        match record {
            Some(record) if matches => {
                if record.enabled {
                    Ok(AuthenticatedUser {
                        username: record.username,
                    })
                } else {
                    debug!(username = %record.username, "Login for disabled account");
                    Err(CredentialError::Disabled)
                }
            }
            _ => Err(CredentialError::Invalid),
        }
    }
}
