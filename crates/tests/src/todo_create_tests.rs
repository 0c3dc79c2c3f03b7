use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn create_todo_with_all_fields() {
    let app = common::test_app();
    let (token, user_id) = common::register_user(&app, "create@test.com").await;

    let body = json!({
        "title": "  Write report  ",
        "description": "Quarterly numbers",
        "category": "work",
        "priority": "high",
        "due_date": "2025-06-01T09:00:00Z",
        "reminder": "2025-05-31T18:00:00Z"
    });
    let (status, todo) =
        common::post_json(&app, "/api/todos", &body.to_string(), Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(todo["title"], "Write report");
    assert_eq!(todo["description"], "Quarterly numbers");
    assert_eq!(todo["category"], "work");
    assert_eq!(todo["priority"], "high");
    assert_eq!(todo["due_date"], "2025-06-01T09:00:00Z");
    assert_eq!(todo["reminder"], "2025-05-31T18:00:00Z");
    assert_eq!(todo["completed"], false);
    assert_eq!(todo["owner_id"], user_id.as_str());
    assert_eq!(todo["subtasks"], json!([]));
    assert!(todo["id"].as_str().is_some());
}

#[tokio::test]
async fn create_accepts_camel_case_due_date_and_bare_date() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "camel@test.com").await;

    let body = json!({ "title": "Dentist", "dueDate": "2025-07-04" });
    let (status, todo) =
        common::post_json(&app, "/api/todos", &body.to_string(), Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(todo["due_date"], "2025-07-04T00:00:00Z");
}

#[tokio::test]
async fn create_ignores_client_supplied_owner_and_id() {
    let app = common::test_app();
    let (token, user_id) = common::register_user(&app, "spoof@test.com").await;
    let forged_owner = uuid::Uuid::new_v4().to_string();
    let forged_id = uuid::Uuid::new_v4().to_string();

    let body = json!({ "title": "Mine", "owner_id": forged_owner, "id": forged_id });
    let (status, todo) =
        common::post_json(&app, "/api/todos", &body.to_string(), Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(todo["owner_id"], user_id.as_str());
    assert_ne!(todo["id"], forged_id.as_str());
}

#[tokio::test]
async fn create_with_blank_title_is_rejected() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "blank@test.com").await;

    let (status, body) =
        common::post_json(&app, "/api/todos", r#"{"title":"   "}"#, Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "ValidationError");
    assert_eq!(body["field_errors"]["title"], "Title is required");

    let (status, _) = common::post_json(&app, "/api/todos", "{}", Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, list) = common::get(&app, "/api/todos", Some(&token)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn create_requires_authentication() {
    let app = common::test_app();

    let (status, body) = common::post_json(&app, "/api/todos", r#"{"title":"x"}"#, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "Unauthorized");
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "order@test.com").await;

    common::create_todo(&app, &token, "first").await;
    common::create_todo(&app, &token, "second").await;
    common::create_todo(&app, &token, "third").await;

    let (status, list) = common::get(&app, "/api/todos", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn create_with_unparsable_reminder_returns_422_error_body() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "badreminder@test.com").await;

    let body = json!({ "title": "x", "reminder": "soon" });
    let (status, err) =
        common::post_json(&app, "/api/todos", &body.to_string(), Some(&token)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "ValidationError");
    assert!(err["message"].as_str().is_some());
}

#[tokio::test]
async fn create_with_malformed_json_returns_400_error_body() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "malformed@test.com").await;

    let (status, err) = common::post_json(&app, "/api/todos", "not json", Some(&token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "BadRequest");
    assert!(err["message"].as_str().is_some());
}

#[tokio::test]
async fn create_without_json_content_type_returns_400_error_body() {
    let app = common::test_app();
    let (token, _) = common::register_user(&app, "plain@test.com").await;

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/todos")
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::from(r#"{"title":"x"}"#))
        .unwrap();
    let (status, err) = common::send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "BadRequest");
}
