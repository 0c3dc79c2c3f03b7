use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::FeatureFlags;

use crate::common;

#[tokio::test]
async fn register_returns_token_and_user() {
    let app = common::test_app();
    let body = json!({ "name": "Ada", "email": "  Ada@Example.COM ", "password": "secret123" });

    let (status, resp) =
        common::post_json(&app, "/api/auth/register", &body.to_string(), None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(resp["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(resp["user"]["email"], "ada@example.com");
    assert_eq!(resp["user"]["name"], "Ada");
    assert!(resp["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_duplicate_email_returns_409() {
    let app = common::test_app();
    common::register_user(&app, "dupe@test.com").await;

    let body = json!({ "name": "Again", "email": "DUPE@test.com", "password": "secret123" });
    let (status, resp) =
        common::post_json(&app, "/api/auth/register", &body.to_string(), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["kind"], "Conflict");
}

#[tokio::test]
async fn register_invalid_input_returns_422() {
    let app = common::test_app();

    let short = json!({ "name": "Ada", "email": "ada@test.com", "password": "123" });
    let (status, resp) =
        common::post_json(&app, "/api/auth/register", &short.to_string(), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["password"].is_string());

    let bad_email = json!({ "name": "Ada", "email": "not-an-email", "password": "secret123" });
    let (status, resp) =
        common::post_json(&app, "/api/auth/register", &bad_email.to_string(), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["email"].is_string());
}

#[tokio::test]
async fn register_disabled_returns_403() {
    let app = common::test_app_with_flags(FeatureFlags {
        registration: false,
        ..FeatureFlags::default()
    });
    let body = json!({ "name": "Ada", "email": "ada@test.com", "password": "secret123" });

    let (status, resp) =
        common::post_json(&app, "/api/auth/register", &body.to_string(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["kind"], "Forbidden");
}

#[tokio::test]
async fn login_with_correct_password() {
    let app = common::test_app();
    let (_, user_id) = common::register_user(&app, "login@test.com").await;

    let body = json!({ "email": "LOGIN@test.com", "password": "secret123" });
    let (status, resp) = common::post_json(&app, "/api/auth/login", &body.to_string(), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["user"]["id"], user_id.as_str());
    let token = resp["token"].as_str().unwrap();

    let (status, me) = common::get(&app, "/api/auth/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "login@test.com");
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = common::test_app();
    common::register_user(&app, "wrongpw@test.com").await;

    let wrong_pw = json!({ "email": "wrongpw@test.com", "password": "nope-nope" });
    let (s1, r1) = common::post_json(&app, "/api/auth/login", &wrong_pw.to_string(), None).await;
    let unknown = json!({ "email": "ghost@test.com", "password": "secret123" });
    let (s2, r2) = common::post_json(&app, "/api/auth/login", &unknown.to_string(), None).await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(r1["message"], r2["message"]);
}

#[tokio::test]
async fn missing_or_invalid_token_is_401() {
    let app = common::test_app();

    let (status, body) = common::get(&app, "/api/todos", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");

    let (status, _) = common::get(&app, "/api/todos", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get(&app, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let app = common::test_app();
    let keys = server::auth::JwtKeys::new("some-other-secret", 60);
    let user = shared_types::User {
        id: uuid::Uuid::new_v4(),
        name: "Mallory".into(),
        email: "mallory@test.com".into(),
        created_at: chrono::Utc::now(),
    };
    let forged = keys.issue(&user).unwrap();

    let (status, _) = common::get(&app, "/api/todos", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bare_token_without_scheme_is_accepted() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "raw@test.com").await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/todos")
        .header("authorization", token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = common::send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn login_with_missing_fields_returns_422_error_body() {
    let app = common::test_app();

    let (status, err) = common::post_json(&app, "/api/auth/login", "{}", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "ValidationError");
}
