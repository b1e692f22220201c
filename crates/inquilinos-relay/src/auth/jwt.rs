//! Bearer token issuance and validation.
//!
//! Tokens are HS512 JWTs. Decoding always checks the signature first; the
//! expiry check is separate so callers can tell an expired token from one
//! that was never valid.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use inquilinos_core::config::MIN_SECRET_BYTES;
use inquilinos_core::time::unix_timestamp;

use super::claims::Claims;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Unparsable, wrong algorithm, or signature mismatch.
    #[error("Token is malformed or its signature is invalid")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Token subject does not match")]
    SubjectMismatch,

    #[error("Signing secret must be at least {min} bytes")]
    WeakSecret { min: usize },

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Manages bearer token creation and validation.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl JwtManager {
    /// Create a manager signing with `secret`; tokens live for `lifetime`.
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(TokenError::WeakSecret {
                min: MIN_SECRET_BYTES,
            });
        }

        let mut validation = Validation::new(Algorithm::HS512);
        // Expiry is judged by `is_expired_at`, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        })
    }

    /// Issue a token for `subject`, valid from now for the configured lifetime.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, unix_timestamp())
    }

    fn issue_at(&self, subject: &str, now: i64) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, subject, and expiry. Every failure is `false`.
    pub fn verify(&self, token: &str, expected_subject: &str) -> bool {
        self.verify_at(token, expected_subject, unix_timestamp()).is_ok()
    }

    fn verify_at(&self, token: &str, expected_subject: &str, now: i64) -> Result<(), TokenError> {
        let claims = self.validate_at(token, now)?;
        if claims.sub != expected_subject {
            return Err(TokenError::SubjectMismatch);
        }
        Ok(())
    }

    /// Validate a presented token and return its claims.
    ///
    /// Unlike [`Self::verify`] the failure reason is kept, for logging.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, unix_timestamp())
    }

    fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = self.decode_verified(token)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode_verified(token).map(|claims| claims.sub)
    }

    pub fn extract_expiry(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claims = self.decode_verified(token)?;
        DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)
    }

    /// Whether a correctly signed token is past its expiry.
    pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
        self.decode_verified(token)
            .map(|claims| claims.is_expired_at(unix_timestamp()))
    }

    /// Signature-checked claims. Nothing is returned from a token that fails
    /// verification.
    fn decode_verified(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Malformed)
    }
}
