pub mod auth;
pub mod todo;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use shared_types::AppError;
use uuid::Uuid;

use crate::db::AppState;
use crate::rate_limit::{rate_limit_middleware, RateLimitState};

/// Parse a path segment as a UUID, rejecting with 400.
pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("Invalid UUID format"))
}

/// Todo and subtask routes. Every handler requires an authenticated caller.
pub fn todo_router() -> Router<AppState> {
    Router::new()
        .route("/api/todos", get(todo::list_todos).post(todo::create_todo))
        .route("/api/todos/reminders/due", get(todo::due_reminders))
        .route("/api/todos/stats", get(todo::todo_stats))
        .route("/api/todos/{id}", put(todo::update_todo).delete(todo::delete_todo))
        .route("/api/todos/{id}/subtasks", post(todo::add_subtask))
        .route(
            "/api/todos/{id}/subtasks/{sub_id}",
            put(todo::toggle_subtask).delete(todo::delete_subtask),
        )
}

/// Account routes.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
}

/// Build the combined REST API router.
pub fn api_router() -> Router<AppState> {
    todo_router().merge(auth_router())
}

/// Same as [`api_router`] with the account routes rate limited.
pub fn api_router_with_rate_limit(rate_limit: RateLimitState) -> Router<AppState> {
    todo_router().merge(auth_router().layer(middleware::from_fn_with_state(
        rate_limit,
        rate_limit_middleware,
    )))
}
