//! HTTP error mapping.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::users::CredentialError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body failed validation.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, expired, or foreign bearer token.
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Authentication failed: {0}")]
    Credentials(#[from] CredentialError),

    /// Detail is logged, never returned.
    #[error("Internal server error")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated
            | Self::Credentials(CredentialError::Invalid | CredentialError::Disabled) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Credentials(CredentialError::Backend(detail)) | Self::Internal(detail) => {
                error!(detail = %detail, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self {
            Self::Credentials(CredentialError::Backend(_)) => {
                "Authentication failed: credential store unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody { error: message });
        if matches!(self, Self::Unauthenticated) {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
