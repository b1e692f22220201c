//! Claim set carried by end-user bearer tokens.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
    /// JWT ID, unique per issued token.
    pub jti: String,
}

impl Claims {
    /// A token expires at its `exp` second, not after it.
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
