use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

/// A login attempt as the server sees it: peer address plus optional
/// forwarding header.
fn login_from(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let body = json!({ "email": "nobody@test.com", "password": "secret123" });
    let peer: SocketAddr = format!("{peer}:40000").parse().unwrap();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer));
    if let Some(value) = forwarded_for {
        builder = builder.header("x-forwarded-for", value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_rate_limit_returns_429_when_exceeded() {
    // Allow only 2 requests per 60s window
    let app = common::test_app_rate_limited(2);

    let (s1, _) = common::send(&app, login_from("10.0.0.1", None)).await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED, "First request should pass the limiter");

    let (s2, _) = common::send(&app, login_from("10.0.0.1", None)).await;
    assert_eq!(s2, StatusCode::UNAUTHORIZED, "Second request should pass the limiter");

    let (s3, body) = common::send(&app, login_from("10.0.0.1", None)).await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS, "Third request should be rate limited");
    assert_eq!(body["kind"], "RateLimited");
}

#[tokio::test]
async fn test_rotating_forwarded_header_does_not_reset_the_limit() {
    let app = common::test_app_rate_limited(2);

    let mut statuses = Vec::new();
    for i in 0..5 {
        let spoofed = format!("10.9.9.{i}");
        let (status, _) = common::send(&app, login_from("10.0.0.1", Some(&spoofed))).await;
        statuses.push(status);
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}

#[tokio::test]
async fn test_clients_without_forwarding_headers_have_separate_buckets() {
    let app = common::test_app_rate_limited(1);

    for peer in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        let (status, _) = common::send(&app, login_from(peer, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{peer} should not share a bucket");
    }

    let (status, _) = common::send(&app, login_from("10.0.0.1", None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_trusted_proxy_keys_on_forwarded_client() {
    let app = common::test_app_behind_proxy(1);
    let proxy = "172.16.0.1";

    let (s1, _) = common::send(&app, login_from(proxy, Some("203.0.113.5"))).await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);

    let (s2, _) = common::send(&app, login_from(proxy, Some("203.0.113.6"))).await;
    assert_eq!(s2, StatusCode::UNAUTHORIZED);

    let (s3, _) = common::send(&app, login_from(proxy, Some("203.0.113.5"))).await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_leaves_todo_routes_alone() {
    let app = common::test_app_rate_limited(1);
    let (token, _) = common::register_user(&app, "limited@test.com").await;

    for _ in 0..5 {
        let (status, _) = common::get(&app, "/api/todos", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
