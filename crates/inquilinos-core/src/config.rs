//! Configuration loading for Inquilinos.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. JSON config file (`--config` / `INQUILINOS_CONFIG`)
//! 3. Environment variables (`INQUILINOS_*`)
//!
//! The result is validated once at startup and then shared read-only.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// HS512 keys shorter than the 512-bit digest size are rejected.
pub const MIN_SECRET_BYTES: usize = 64;

pub const ENV_ADDR: &str = "INQUILINOS_ADDR";
pub const ENV_JWT_SECRET: &str = "INQUILINOS_JWT_SECRET";
pub const ENV_JWT_LIFETIME_SECS: &str = "INQUILINOS_JWT_LIFETIME_SECS";
pub const ENV_VENDOR_BASE_URL: &str = "INQUILINOS_VENDOR_BASE_URL";
pub const ENV_VENDOR_CLIENT_ID: &str = "INQUILINOS_VENDOR_CLIENT_ID";
pub const ENV_VENDOR_CLIENT_SECRET: &str = "INQUILINOS_VENDOR_CLIENT_SECRET";
pub const ENV_VENDOR_TIMEOUT_SECS: &str = "INQUILINOS_VENDOR_TIMEOUT_SECS";
pub const ENV_USERS_FILE: &str = "INQUILINOS_USERS_FILE";

/// Complete relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub vendor: VendorConfig,
    #[serde(default)]
    pub users: UsersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Signing material for end-user bearer tokens.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub secret: String,
    pub lifetime_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            lifetime_secs: 3600,
        }
    }
}

impl TokenConfig {
    pub const fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}

/// Smart-lock vendor API endpoint and its static client credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: 10,
        }
    }
}

impl VendorConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL for `path` under the vendor base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UsersConfig {
    /// JSON file holding the user directory.
    pub file: Option<PathBuf>,
}

impl Config {
    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.token.secret.is_empty() {
            return Err(Error::Config(format!(
                "token.secret is required (or set {ENV_JWT_SECRET})"
            )));
        }
        if self.token.secret.len() < MIN_SECRET_BYTES {
            return Err(Error::Config(format!(
                "token.secret must be at least {MIN_SECRET_BYTES} bytes, got {}",
                self.token.secret.len()
            )));
        }
        if self.token.lifetime_secs == 0 {
            return Err(Error::Config("token.lifetime_secs must be > 0".into()));
        }

        let base_url = self.vendor.base_url.trim();
        if base_url.is_empty() {
            return Err(Error::Config(format!(
                "vendor.base_url is required (or set {ENV_VENDOR_BASE_URL})"
            )));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "vendor.base_url must start with http:// or https://, got {base_url}"
            )));
        }
        if self.vendor.client_id.is_empty() {
            return Err(Error::Config("vendor.client_id is required".into()));
        }
        if self.vendor.client_secret.is_empty() {
            return Err(Error::Config("vendor.client_secret is required".into()));
        }
        if self.vendor.timeout_secs == 0 {
            return Err(Error::Config("vendor.timeout_secs must be > 0".into()));
        }

        if self.users.file.is_none() {
            return Err(Error::Config(format!(
                "users.file is required (or set {ENV_USERS_FILE})"
            )));
        }
        Ok(())
    }
}

/// Load, override from the process environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `INQUILINOS_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_ADDR) {
        config.server.addr = parse_env(ENV_ADDR, &val)?;
    }
    if let Some(val) = lookup(ENV_JWT_SECRET) {
        config.token.secret = val;
    }
    if let Some(val) = lookup(ENV_JWT_LIFETIME_SECS) {
        config.token.lifetime_secs = parse_env(ENV_JWT_LIFETIME_SECS, &val)?;
    }
    if let Some(val) = lookup(ENV_VENDOR_BASE_URL) {
        config.vendor.base_url = val;
    }
    if let Some(val) = lookup(ENV_VENDOR_CLIENT_ID) {
        config.vendor.client_id = val;
    }
    if let Some(val) = lookup(ENV_VENDOR_CLIENT_SECRET) {
        config.vendor.client_secret = val;
    }
    if let Some(val) = lookup(ENV_VENDOR_TIMEOUT_SECS) {
        config.vendor.timeout_secs = parse_env(ENV_VENDOR_TIMEOUT_SECS, &val)?;
    }
    if let Some(val) = lookup(ENV_USERS_FILE) {
        config.users.file = Some(PathBuf::from(val));
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value:?} is invalid: {e}")))
}
