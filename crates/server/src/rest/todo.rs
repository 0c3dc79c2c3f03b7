use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use shared_types::{
    AddSubtaskRequest, AppError, AppJson, CreateTodoRequest, MessageResponse, Todo, TodoFilter,
    TodoStats, UpdateTodoRequest,
};

use super::parse_uuid;
use crate::auth::AuthUser;
use crate::service::TodoService;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct TodoListParams {
    /// Case-insensitive match on title or description.
    pub q: Option<String>,
    /// `all`, `active`, `completed`, or a category label.
    pub filter: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /api/todos
// ---------------------------------------------------------------------------

/// List the caller's todos, newest first.
#[utoipa::path(
    get,
    path = "/api/todos",
    params(TodoListParams),
    responses(
        (status = 200, description = "Todo list", body = Vec<Todo>),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn list_todos(
    State(todos): State<TodoService>,
    user: AuthUser,
    Query(params): Query<TodoListParams>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let owner = user.id();
    let list = match (&params.q, &params.filter) {
        (None, None) => todos.list(owner).await?,
        (q, filter) => {
            let filter = filter.as_deref().map(TodoFilter::parse).unwrap_or_default();
            todos
                .list_filtered(owner, q.as_deref().unwrap_or(""), &filter)
                .await?
        }
    };
    Ok(Json(list))
}

// ---------------------------------------------------------------------------
// POST /api/todos
// ---------------------------------------------------------------------------

/// Create a todo owned by the caller.
#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 200, description = "Todo created", body = Todo),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 422, description = "Title missing", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn create_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    AppJson(body): AppJson<CreateTodoRequest>,
) -> Result<Json<Todo>, AppError> {
    let todo = todos.create(user.id(), body).await?;
    Ok(Json(todo))
}

// ---------------------------------------------------------------------------
// PUT /api/todos/{id}
// ---------------------------------------------------------------------------

/// Partially update a todo. Absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    params(("id" = String, Path, description = "Todo UUID")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = Todo),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Invalid field", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn update_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateTodoRequest>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_uuid(&id)?;
    let todo = todos.update(user.id(), id, body).await?;
    Ok(Json(todo))
}

// ---------------------------------------------------------------------------
// DELETE /api/todos/{id}
// ---------------------------------------------------------------------------

/// Delete a todo and its subtasks. Succeeds even if it was already gone.
#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    params(("id" = String, Path, description = "Todo UUID")),
    responses(
        (status = 200, description = "Todo deleted", body = MessageResponse)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn delete_todo(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_uuid(&id)?;
    todos.delete(user.id(), id).await?;
    Ok(Json(MessageResponse::new("Todo deleted")))
}

// ---------------------------------------------------------------------------
// GET /api/todos/reminders/due
// ---------------------------------------------------------------------------

/// Open todos whose reminder time has passed.
#[utoipa::path(
    get,
    path = "/api/todos/reminders/due",
    responses(
        (status = 200, description = "Todos with a due reminder", body = Vec<Todo>)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn due_reminders(
    State(todos): State<TodoService>,
    user: AuthUser,
) -> Result<Json<Vec<Todo>>, AppError> {
    let due = todos.due_reminders(user.id(), Utc::now()).await?;
    Ok(Json(due))
}

// ---------------------------------------------------------------------------
// GET /api/todos/stats
// ---------------------------------------------------------------------------

/// Total, active and completed counts.
#[utoipa::path(
    get,
    path = "/api/todos/stats",
    responses(
        (status = 200, description = "Counters", body = TodoStats)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn todo_stats(
    State(todos): State<TodoService>,
    user: AuthUser,
) -> Result<Json<TodoStats>, AppError> {
    let list = todos.list(user.id()).await?;
    Ok(Json(TodoStats::from_todos(&list)))
}

// ---------------------------------------------------------------------------
// POST /api/todos/{id}/subtasks
// ---------------------------------------------------------------------------

/// Append a subtask.
#[utoipa::path(
    post,
    path = "/api/todos/{id}/subtasks",
    params(("id" = String, Path, description = "Todo UUID")),
    request_body = AddSubtaskRequest,
    responses(
        (status = 200, description = "Updated todo", body = Todo),
        (status = 404, description = "Todo not found", body = AppError),
        (status = 422, description = "Text missing", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn add_subtask(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<AddSubtaskRequest>,
) -> Result<Json<Todo>, AppError> {
    let id = parse_uuid(&id)?;
    let todo = todos.add_subtask(user.id(), id, &body.text).await?;
    Ok(Json(todo))
}

// ---------------------------------------------------------------------------
// PUT /api/todos/{id}/subtasks/{sub_id}
// ---------------------------------------------------------------------------

/// Flip a subtask's completed flag.
#[utoipa::path(
    put,
    path = "/api/todos/{id}/subtasks/{sub_id}",
    params(
        ("id" = String, Path, description = "Todo UUID"),
        ("sub_id" = String, Path, description = "Subtask UUID")
    ),
    responses(
        (status = 200, description = "Updated todo", body = Todo),
        (status = 404, description = "Todo or subtask not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn toggle_subtask(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path((id, sub_id)): Path<(String, String)>,
) -> Result<Json<Todo>, AppError> {
    let (id, sub_id) = (parse_uuid(&id)?, parse_uuid(&sub_id)?);
    let todo = todos.toggle_subtask(user.id(), id, sub_id).await?;
    Ok(Json(todo))
}

// ---------------------------------------------------------------------------
// DELETE /api/todos/{id}/subtasks/{sub_id}
// ---------------------------------------------------------------------------

/// Remove a subtask. An already-absent subtask is not an error.
#[utoipa::path(
    delete,
    path = "/api/todos/{id}/subtasks/{sub_id}",
    params(
        ("id" = String, Path, description = "Todo UUID"),
        ("sub_id" = String, Path, description = "Subtask UUID")
    ),
    responses(
        (status = 200, description = "Updated todo", body = Todo),
        (status = 404, description = "Todo not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "subtasks"
)]
pub async fn delete_subtask(
    State(todos): State<TodoService>,
    user: AuthUser,
    Path((id, sub_id)): Path<(String, String)>,
) -> Result<Json<Todo>, AppError> {
    let (id, sub_id) = (parse_uuid(&id)?, parse_uuid(&sub_id)?);
    let todo = todos.delete_subtask(user.id(), id, sub_id).await?;
    Ok(Json(todo))
}
