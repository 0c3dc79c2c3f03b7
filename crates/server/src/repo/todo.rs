use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{AppError, Subtask, Todo};
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{NewTodo, OwnedKey, SubtaskToggle, TodoChanges, TodoStore};
use crate::error_convert::SqlxErrorExt;

/// Todos in Postgres. Subtasks are a JSONB array on the todo row so every
/// subtask operation is a single-row `UPDATE`.
#[derive(Clone)]
pub struct PgTodoStore {
    pool: Pool<Postgres>,
}

impl PgTodoStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    due_date: Option<DateTime<Utc>>,
    reminder: Option<DateTime<Utc>>,
    completed: bool,
    subtasks: Json<Vec<Subtask>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            category: row.category,
            priority: row.priority,
            due_date: row.due_date,
            reminder: row.reminder,
            completed: row.completed,
            subtasks: row.subtasks.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
        Ok(())
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Todo>, AppError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, owner_id, title, description, category, priority,
                   due_date, reminder, completed, subtasks, created_at, updated_at
            FROM todos
            WHERE owner_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn insert(&self, owner: Uuid, todo: NewTodo) -> Result<Todo, AppError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            INSERT INTO todos (id, owner_id, title, description, category, priority,
                               due_date, reminder, completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, owner_id, title, description, category, priority,
                      due_date, reminder, completed, subtasks, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(&todo.category)
        .bind(&todo.priority)
        .bind(todo.due_date)
        .bind(todo.reminder)
        .bind(todo.completed)
        .fetch_one(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.into())
    }

    async fn find_owned(&self, key: OwnedKey) -> Result<Option<Todo>, AppError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, owner_id, title, description, category, priority,
                   due_date, reminder, completed, subtasks, created_at, updated_at
            FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(key.id)
        .bind(key.owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.map(Todo::from))
    }

    async fn update_owned(
        &self,
        key: OwnedKey,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, AppError> {
        // Nullable columns take a (present, value) pair so `null` can clear them.
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos SET
                title       = COALESCE($3, title),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                category    = CASE WHEN $6 THEN $7 ELSE category END,
                priority    = CASE WHEN $8 THEN $9 ELSE priority END,
                due_date    = CASE WHEN $10 THEN $11 ELSE due_date END,
                reminder    = CASE WHEN $12 THEN $13 ELSE reminder END,
                completed   = COALESCE($14, completed),
                updated_at  = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, category, priority,
                      due_date, reminder, completed, subtasks, created_at, updated_at
            "#,
        )
        .bind(key.id)
        .bind(key.owner)
        .bind(changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(changes.category.is_some())
        .bind(changes.category.flatten())
        .bind(changes.priority.is_some())
        .bind(changes.priority.flatten())
        .bind(changes.due_date.is_some())
        .bind(changes.due_date.flatten())
        .bind(changes.reminder.is_some())
        .bind(changes.reminder.flatten())
        .bind(changes.completed)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.map(Todo::from))
    }

    async fn delete_owned(&self, key: OwnedKey) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
            .bind(key.id)
            .bind(key.owner)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_subtask(
        &self,
        key: OwnedKey,
        subtask: Subtask,
    ) -> Result<Option<Todo>, AppError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos SET
                subtasks   = subtasks || $3::jsonb,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, category, priority,
                      due_date, reminder, completed, subtasks, created_at, updated_at
            "#,
        )
        .bind(key.id)
        .bind(key.owner)
        .bind(Json(vec![subtask]))
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.map(Todo::from))
    }

    async fn toggle_subtask(
        &self,
        key: OwnedKey,
        subtask_id: Uuid,
    ) -> Result<SubtaskToggle, AppError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos SET
                subtasks = (
                    SELECT jsonb_agg(
                        CASE WHEN elem->>'id' = $3
                             THEN jsonb_set(elem, '{completed}',
                                  to_jsonb(NOT COALESCE((elem->>'completed')::boolean, false)))
                             ELSE elem
                        END
                        ORDER BY ord)
                    FROM jsonb_array_elements(subtasks) WITH ORDINALITY AS t(elem, ord)
                ),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
              AND EXISTS (
                  SELECT 1 FROM jsonb_array_elements(subtasks) AS s(elem)
                  WHERE s.elem->>'id' = $3
              )
            RETURNING id, owner_id, title, description, category, priority,
                      due_date, reminder, completed, subtasks, created_at, updated_at
            "#,
        )
        .bind(key.id)
        .bind(key.owner)
        .bind(subtask_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        if let Some(row) = row {
            return Ok(SubtaskToggle::Toggled(row.into()));
        }

        match self.find_owned(key).await? {
            Some(_) => Ok(SubtaskToggle::SubtaskMissing),
            None => Ok(SubtaskToggle::TodoMissing),
        }
    }

    async fn remove_subtask(
        &self,
        key: OwnedKey,
        subtask_id: Uuid,
    ) -> Result<Option<Todo>, AppError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos SET
                subtasks = COALESCE((
                    SELECT jsonb_agg(elem ORDER BY ord)
                    FROM jsonb_array_elements(subtasks) WITH ORDINALITY AS t(elem, ord)
                    WHERE elem->>'id' <> $3
                ), '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, category, priority,
                      due_date, reminder, completed, subtasks, created_at, updated_at
            "#,
        )
        .bind(key.id)
        .bind(key.owner)
        .bind(subtask_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(row.map(Todo::from))
    }
}
