#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use inquilinos_core::config::VendorConfig;
use inquilinos_core::time::parse_iso8601;
use inquilinos_relay::auth::JwtManager;
use inquilinos_relay::server::{AppState, build_router};
use inquilinos_relay::users::{AuthenticatedUser, CredentialError, CredentialVerifier};
use inquilinos_relay::vendor::{HttpCaller, HttpReply, LockRelay, TransportError};

const SECRET: &[u8] = b"integration-secret-integration-secret-integration-secret-0123456789";

struct FakeUsers {
    // username -> (password, enabled)
    users: HashMap<&'static str, (&'static str, bool)>,
}

#[async_trait]
impl CredentialVerifier for FakeUsers {
    async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, CredentialError> {
        match self.users.get(username) {
            Some((pw, true)) if *pw == password => Ok(AuthenticatedUser {
                username: username.to_string(),
            }),
            Some((pw, false)) if *pw == password => Err(CredentialError::Disabled),
            _ => Err(CredentialError::Invalid),
        }
    }
}

enum VendorMode {
    Status(u16),
    Down,
    Panic,
}

struct FakeVendor {
    mode: VendorMode,
    bodies: Mutex<Vec<Value>>,
}

impl FakeVendor {
    fn calls(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpCaller for FakeVendor {
    async fn post_json(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpReply, TransportError> {
        self.bodies.lock().unwrap().push(body.clone());
        match self.mode {
            VendorMode::Status(status) => Ok(HttpReply {
                status,
                body: "{}".to_string(),
            }),
            VendorMode::Down => Err(TransportError::Connect("connection refused".into())),
            VendorMode::Panic => panic!("vendor client exploded"),
        }
    }
}

struct Harness {
    app: axum::Router,
    jwt: Arc<JwtManager>,
    vendor: Arc<FakeVendor>,
}

fn harness(mode: VendorMode) -> Harness {
    let jwt = Arc::new(JwtManager::new(SECRET, Duration::from_secs(3600)).unwrap());
    let users = Arc::new(FakeUsers {
        users: HashMap::from([("alice", ("secret", true)), ("carol", ("hunter2", false))]),
    });
    let vendor = Arc::new(FakeVendor {
        mode,
        bodies: Mutex::new(Vec::new()),
    });
    let vendor_config = Arc::new(VendorConfig {
        base_url: "https://vendor.example".into(),
        client_id: "acme".into(),
        client_secret: "s3cret".into(),
        timeout_secs: 5,
    });
    let relay = Arc::new(LockRelay::new(
        vendor_config,
        Arc::clone(&vendor) as Arc<dyn HttpCaller>,
    ));

    let app = build_router(AppState {
        jwt: Arc::clone(&jwt),
        users,
        relay,
    });
    Harness { app, jwt, vendor }
}

/// Send a request to the app and return (status, JSON body or Null).
async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn login(app: &axum::Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        post_json(
            "/api/auth/login",
            None,
            &json!({ "username": username, "password": password }),
        ),
    )
    .await
}

async fn open_lock(app: &axum::Router, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
    send(app, post_json("/api/lock/open", token, body)).await
}

#[tokio::test]
async fn health_is_public() {
    let h = harness(VendorMode::Status(200));
    let resp = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_returns_bearer_token_for_subject() {
    let h = harness(VendorMode::Status(200));
    let (status, body) = login(&h.app, "alice", "secret").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Bearer");
    assert_eq!(body["username"], "alice");
    let token = body["token"].as_str().unwrap();
    assert!(h.jwt.verify(token, "alice"));
    assert!(!h.jwt.verify(token, "carol"));
}

#[tokio::test]
async fn login_with_wrong_password_is_client_error_without_token() {
    let h = harness(VendorMode::Status(200));
    let (status, body) = login(&h.app, "alice", "wrong").await;

    assert!(status.is_client_error());
    assert!(body.get("token").is_none());
    assert!(
        body["error"].as_str().unwrap().contains("Invalid credentials"),
        "{body}"
    );
}

#[tokio::test]
async fn login_to_disabled_account_names_the_cause() {
    let h = harness(VendorMode::Status(200));
    let (status, body) = login(&h.app, "carol", "hunter2").await;

    assert!(status.is_client_error());
    assert!(body.get("token").is_none());
    assert!(body["error"].as_str().unwrap().contains("Account disabled"), "{body}");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let h = harness(VendorMode::Status(200));
    let (status, _) = login(&h.app, "", "secret").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = login(&h.app, "alice", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_does_not_trim_username() {
    let h = harness(VendorMode::Status(200));
    let (status, body) = login(&h.app, " alice ", "secret").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());

    let (status, _) = login(&h.app, "   ", "secret").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_then_open_lock() {
    let h = harness(VendorMode::Status(200));
    let (_, login_body) = login(&h.app, "alice", "secret").await;
    let token = login_body["token"].as_str().unwrap();

    let (status, body) = open_lock(&h.app, Some(token), &json!({ "lockId": "door-1" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!body["message"].as_str().unwrap().is_empty());
    assert!(parse_iso8601(body["timestamp"].as_str().unwrap()).is_some());

    let calls = h.vendor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["lockId"], "door-1");
    assert_eq!(calls[0]["userId"], "alice");
    assert!(parse_iso8601(calls[0]["timestamp"].as_str().unwrap()).is_some());
}

#[tokio::test]
async fn explicit_user_id_is_forwarded() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();

    let (status, _) = open_lock(
        &h.app,
        Some(token.as_str()),
        &json!({ "lockId": "door-1", "userId": "guest-42" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.vendor.calls()[0]["userId"], "guest-42");
}

#[tokio::test]
async fn open_lock_without_token_is_unauthorized() {
    let h = harness(VendorMode::Status(200));
    let (status, _) = open_lock(&h.app, None, &json!({ "lockId": "door-1" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.vendor.calls().is_empty());
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let h = harness(VendorMode::Status(200));
    let (status, body) =
        open_lock(&h.app, Some("not.a.token"), &json!({ "lockId": "door-1" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthenticated");
    assert!(h.vendor.calls().is_empty());
}

#[tokio::test]
async fn token_from_another_key_is_unauthorized() {
    let h = harness(VendorMode::Status(200));
    let other = JwtManager::new(
        b"some-other-deployment-secret-some-other-deployment-secret-0123456789",
        Duration::from_secs(3600),
    )
    .unwrap();
    let token = other.issue("alice").unwrap();

    let (status, _) = open_lock(&h.app, Some(token.as_str()), &json!({ "lockId": "door-1" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let h = harness(VendorMode::Status(200));
    // Zero lifetime: the token expires the second it is issued.
    let short_lived = JwtManager::new(SECRET, Duration::ZERO).unwrap();
    let token = short_lived.issue("alice").unwrap();

    let (status, _) = open_lock(&h.app, Some(token.as_str()), &json!({ "lockId": "door-1" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.vendor.calls().is_empty());
}

#[tokio::test]
async fn empty_lock_id_is_rejected_before_vendor_call() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();

    for body in [json!({ "lockId": "" }), json!({})] {
        let (status, resp) = open_lock(&h.app, Some(token.as_str()), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["success"], false);
        assert_eq!(resp["message"], "lockId is required");
    }
    assert!(h.vendor.calls().is_empty());
}

#[tokio::test]
async fn unparsable_caller_timestamp_is_rejected() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();

    let (status, resp) = open_lock(
        &h.app,
        Some(token.as_str()),
        &json!({ "lockId": "door-1", "timestamp": "half past nine" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["success"], false);
    assert!(h.vendor.calls().is_empty());
}

#[tokio::test]
async fn caller_timestamp_without_offset_is_accepted() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();

    for ts in ["2025-03-01T10:00:00.123", "2025-03-01T10:00:00+02:00"] {
        let (status, resp) = open_lock(
            &h.app,
            Some(token.as_str()),
            &json!({ "lockId": "door-1", "timestamp": ts }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{ts}: {resp}");
        assert_eq!(resp["success"], true);
    }
    assert_eq!(h.vendor.calls().len(), 2);
}

#[tokio::test]
async fn empty_user_and_timestamp_fall_back_to_caller_and_now() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();
    let before = chrono::Utc::now() - chrono::Duration::seconds(1);

    let (status, _) = open_lock(
        &h.app,
        Some(token.as_str()),
        &json!({ "lockId": "door-1", "userId": "", "timestamp": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let calls = h.vendor.calls();
    assert_eq!(calls[0]["userId"], "alice");
    let sent_at = parse_iso8601(calls[0]["timestamp"].as_str().unwrap()).unwrap();
    assert!(sent_at >= before, "{sent_at}");
}

#[tokio::test]
async fn caller_timestamp_is_accepted_but_not_returned() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();

    let (status, resp) = open_lock(
        &h.app,
        Some(token.as_str()),
        &json!({ "lockId": "door-1", "timestamp": "2000-01-01T00:00:00Z" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(resp["timestamp"], "2000-01-01T00:00:00Z");
}

#[tokio::test]
async fn vendor_error_status_is_client_error_result() {
    let h = harness(VendorMode::Status(500));
    let token = h.jwt.issue("alice").unwrap();

    let (status, resp) = open_lock(&h.app, Some(token.as_str()), &json!({ "lockId": "door-1" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["success"], false);
    assert!(resp["message"].as_str().unwrap().contains("500"), "{resp}");
    assert!(parse_iso8601(resp["timestamp"].as_str().unwrap()).is_some());
}

#[tokio::test]
async fn vendor_down_is_client_error_result() {
    let h = harness(VendorMode::Down);
    let token = h.jwt.issue("alice").unwrap();

    let (status, resp) = open_lock(&h.app, Some(token.as_str()), &json!({ "lockId": "door-1" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["success"], false);
    assert!(!resp["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn relay_panic_becomes_failure_result() {
    let h = harness(VendorMode::Panic);
    let token = h.jwt.issue("alice").unwrap();

    let (status, resp) = open_lock(&h.app, Some(token.as_str()), &json!({ "lockId": "door-1" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["success"], false);
    let message = resp["message"].as_str().unwrap();
    assert!(message.starts_with("Failed to process request"), "{message}");
    assert!(message.contains("vendor client exploded"), "{message}");
}

#[tokio::test]
async fn malformed_body_is_failure_result() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/lock/open")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, resp) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["success"], false);
    assert!(!resp["message"].as_str().unwrap().is_empty(), "{resp}");
    assert!(parse_iso8601(resp["timestamp"].as_str().unwrap()).is_some());
    assert!(h.vendor.calls().is_empty());
}

#[tokio::test]
async fn mistyped_lock_fields_are_failure_results() {
    let h = harness(VendorMode::Status(200));
    let token = h.jwt.issue("alice").unwrap();

    for body in [json!({ "lockId": 42 }), json!({ "lockId": null })] {
        let (status, resp) = open_lock(&h.app, Some(token.as_str()), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(resp["success"], false, "{body}");
        assert!(resp["message"].is_string(), "{resp}");
        assert!(resp["timestamp"].is_string(), "{resp}");
    }
    assert!(h.vendor.calls().is_empty());
}

#[tokio::test]
async fn mistyped_login_body_gets_error_body() {
    let h = harness(VendorMode::Status(200));
    let (status, body) = send(
        &h.app,
        post_json(
            "/api/auth/login",
            None,
            &json!({ "username": 7, "password": "secret" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
    assert!(body.get("token").is_none());
}
