//! Bearer token check for protected routes.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use super::AppState;
use super::error::ApiError;

/// The caller behind a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// Validate `Authorization: Bearer <token>` and attach the [`Identity`].
///
/// Every rejection reason collapses to 401; the reason is only logged.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(req.headers()) else {
        debug!(path = %req.uri().path(), "Missing bearer token");
        return Err(ApiError::Unauthenticated);
    };

    let claims = state.jwt.validate(token).map_err(|e| {
        debug!(reason = %e, "Rejected bearer token");
        ApiError::Unauthenticated
    })?;

    req.extensions_mut().insert(Identity {
        username: claims.sub,
    });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
