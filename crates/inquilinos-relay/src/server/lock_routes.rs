//! `POST /api/lock/open`.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::{debug, error, info, instrument};

use inquilinos_core::time::{now_iso8601, parse_iso8601};

use super::AppState;
use super::middleware::Identity;
use crate::vendor::relay::LOCK_ID_REQUIRED;
use crate::vendor::{LockCommand, LockCommandResult};

/// Relay an open-lock command on behalf of the authenticated caller.
///
/// `userId` defaults to the caller, `timestamp` to now. 200 when the vendor
/// accepted the command, 400 otherwise; the body is always a
/// [`LockCommandResult`], including for bodies that fail to deserialize.
#[instrument(skip_all, fields(route = "open_lock"))]
pub async fn open_lock(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<LockCommand>, JsonRejection>,
) -> (StatusCode, Json<LockCommandResult>) {
    let mut command = match body {
        Ok(Json(command)) => command,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Rejected open-lock body");
            return respond(LockCommandResult::failed(rejection.body_text()));
        }
    };
    if !command.has_lock_id() {
        return respond(LockCommandResult::failed(LOCK_ID_REQUIRED));
    }
    if let Some(ts) = command.timestamp()
        && parse_iso8601(ts).is_none()
    {
        return respond(LockCommandResult::failed(format!(
            "timestamp must be an ISO-8601 date-time, got {ts:?}"
        )));
    }

    if command.user_id().is_none() {
        command.user_id = Some(identity.username.clone());
    }
    if command.timestamp().is_none() {
        command.timestamp = Some(now_iso8601());
    }

    info!(
        username = %identity.username,
        lock_id = %command.lock_id,
        user_id = command.user_id().unwrap_or_default(),
        requested_at = command.timestamp().unwrap_or_default(),
        "Relaying open-lock command"
    );

    // Run the relay in its own task so a panic there still yields a result.
    let relay = Arc::clone(&state.relay);
    let result = match tokio::spawn(async move { relay.open_lock(&command).await }).await {
        Ok(result) => result,
        Err(e) => {
            let cause = join_failure(e);
            error!(cause = %cause, "Lock relay task failed");
            LockCommandResult::failed(format!("Failed to process request: {cause}"))
        }
    };
    respond(result)
}

fn respond(result: LockCommandResult) -> (StatusCode, Json<LockCommandResult>) {
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(result))
}

fn join_failure(e: tokio::task::JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "relay task panicked".to_string())
}
