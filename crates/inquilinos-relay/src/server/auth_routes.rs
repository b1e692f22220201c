//! `POST /api/auth/login`.

use std::fmt;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::AppState;
use super::error::ApiError;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub username: String,
}

impl LoginResponse {
    pub fn bearer(token: String, username: String) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            username,
        }
    }
}

/// Check credentials and mint a bearer token. No token on any failure path.
#[instrument(skip_all, fields(route = "login"))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

    // Checked as sent: " alice " is not "alice".
    let username = req.username.as_str();
    if username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".into(),
        ));
    }

    let user = state
        .users
        .verify(username, &req.password)
        .await
        .map_err(|e| {
            warn!(username = %username, reason = %e, "Failed login attempt");
            ApiError::from(e)
        })?;

    let token = state
        .jwt
        .issue(&user.username)
        .map_err(|e| ApiError::Internal(format!("Token creation failed: {e}")))?;

    info!(username = %user.username, "User logged in");
    Ok(Json(LoginResponse::bearer(token, user.username)))
}
