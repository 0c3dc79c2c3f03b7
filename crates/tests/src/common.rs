use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use server::auth::JwtKeys;
use server::db::AppState;
use server::rate_limit::RateLimitState;
use shared_types::FeatureFlags;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

/// Build a router over fresh in-memory stores with default flags.
pub fn test_app() -> Router {
    test_app_with_flags(FeatureFlags::default())
}

pub fn test_app_with_flags(flags: FeatureFlags) -> Router {
    let state = AppState::in_memory(JwtKeys::new(TEST_SECRET, 60), flags);
    server::openapi::api_router(state, None)
}

/// Router whose account routes allow `max` calls per minute per peer address.
pub fn test_app_rate_limited(max: u32) -> Router {
    rate_limited(RateLimitState::new(max, Duration::from_secs(60)))
}

/// Same, but keyed on the proxy-reported client address.
pub fn test_app_behind_proxy(max: u32) -> Router {
    rate_limited(RateLimitState::new(max, Duration::from_secs(60)).trust_forwarded(true))
}

fn rate_limited(limit: RateLimitState) -> Router {
    let state = AppState::in_memory(JwtKeys::new(TEST_SECRET, 60), FeatureFlags::default());
    server::openapi::api_router(state, Some(limit))
}

/// Register an account and return its token and user id.
pub async fn register_user(app: &Router, email: &str) -> (String, String) {
    let body = json!({ "name": "Test User", "email": email, "password": "secret123" });
    let (status, resp) = post_json(app, "/api/auth/register", &body.to_string(), None).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {resp}");
    (
        resp["token"].as_str().unwrap().to_string(),
        resp["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a todo with just a title and return the response body.
pub async fn create_todo(app: &Router, token: &str, title: &str) -> Value {
    let body = json!({ "title": title });
    let (status, resp) = post_json(app, "/api/todos", &body.to_string(), Some(token)).await;
    assert_eq!(status, StatusCode::OK, "create failed: {resp}");
    resp
}

fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
}

/// POST JSON, optionally with a bearer token.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &str,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let req = builder("POST", uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// PUT JSON, optionally with a bearer token.
pub async fn put_json(
    app: &Router,
    uri: &str,
    body: &str,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let req = builder("PUT", uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, req).await
}

/// GET, optionally with a bearer token.
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let req = builder("GET", uri, token).body(Body::empty()).unwrap();
    send(app, req).await
}

/// DELETE, optionally with a bearer token.
pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let req = builder("DELETE", uri, token).body(Body::empty()).unwrap();
    send(app, req).await
}

/// Send a request through the router and parse the response.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}
