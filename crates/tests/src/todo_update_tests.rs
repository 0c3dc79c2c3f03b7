use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn update_completed_leaves_other_fields() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "complete@test.com").await;
    let body = json!({ "title": "Laundry", "description": "whites", "category": "personal" });
    let (_, created) =
        common::post_json(&app, "/api/todos", &body.to_string(), Some(&token)).await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = common::put_json(
        &app,
        &format!("/api/todos/{id}"),
        r#"{"completed":true}"#,
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["title"], "Laundry");
    assert_eq!(updated["description"], "whites");
    assert_eq!(updated["category"], "personal");
    assert_eq!(updated["created_at"], created["created_at"]);
}

#[tokio::test]
async fn update_null_clears_optional_field() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "clear@test.com").await;
    let body = json!({ "title": "Call mom", "due_date": "2025-06-01", "priority": "low" });
    let (_, created) =
        common::post_json(&app, "/api/todos", &body.to_string(), Some(&token)).await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = common::put_json(
        &app,
        &format!("/api/todos/{id}"),
        r#"{"due_date":null}"#,
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["due_date"], serde_json::Value::Null);
    assert_eq!(updated["priority"], "low");
}

#[tokio::test]
async fn update_blank_title_is_rejected() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "blanktitle@test.com").await;
    let created = common::create_todo(&app, &token, "Keep me").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = common::put_json(
        &app,
        &format!("/api/todos/{id}"),
        r#"{"title":"  "}"#,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "ValidationError");

    let (_, list) = common::get(&app, "/api/todos", Some(&token)).await;
    assert_eq!(list[0]["title"], "Keep me");
}

#[tokio::test]
async fn update_unknown_todo_returns_404() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "missing@test.com").await;
    let fake = uuid::Uuid::new_v4();

    let (status, body) = common::put_json(
        &app,
        &format!("/api/todos/{fake}"),
        r#"{"completed":true}"#,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Todo not found");
}

#[tokio::test]
async fn update_with_malformed_id_returns_400() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "badid@test.com").await;

    let (status, body) = common::put_json(
        &app,
        "/api/todos/not-a-uuid",
        r#"{"completed":true}"#,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid UUID format");
}

#[tokio::test]
async fn empty_update_returns_current_record() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "noop@test.com").await;
    let created = common::create_todo(&app, &token, "Same").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) =
        common::put_json(&app, &format!("/api/todos/{id}"), "{}", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn update_with_wrong_field_type_returns_422_error_body() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "wrongtype@test.com").await;
    let todo = common::create_todo(&app, &token, "Typed").await;
    let uri = format!("/api/todos/{}", todo["id"].as_str().unwrap());

    let (status, err) =
        common::put_json(&app, &uri, r#"{"completed":"yes"}"#, Some(&token)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "ValidationError");
}
