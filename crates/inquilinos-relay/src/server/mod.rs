//! HTTP server for the Inquilinos relay.

pub mod auth_routes;
pub mod error;
pub mod lock_routes;
pub mod middleware;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use crate::users::CredentialVerifier;
use crate::vendor::LockRelay;

pub use error::ApiError;
pub use middleware::Identity;

/// Shared, read-only handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtManager>,
    pub users: Arc<dyn CredentialVerifier>,
    pub relay: Arc<LockRelay>,
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/lock/open", post(lock_routes::open_lock))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_bearer,
        ));

    Router::new()
        .route("/api/auth/login", post(auth_routes::login))
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /health`
async fn health() -> &'static str {
    "ok"
}
