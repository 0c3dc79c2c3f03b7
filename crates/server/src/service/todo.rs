//! Todo access layer.
//!
//! All reads and writes of todos and their subtasks go through
//! [`TodoService`]. Every operation takes the caller's id as `owner` and
//! resolves records by `(id, owner)`; a todo owned by someone else is
//! reported exactly like a missing one.

use chrono::{DateTime, Utc};
use shared_types::{
    filter_todos, is_reminder_due, AppError, CreateTodoRequest, Subtask, Todo, TodoFilter,
    UpdateTodoRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::repo::{NewTodo, OwnedKey, SubtaskToggle, TodoChanges, TodoStore};

const TODO_NOT_FOUND: &str = "Todo not found";
const SUBTASK_NOT_FOUND: &str = "Subtask not found";

#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.store.ping().await
    }

    /// All of `owner`'s todos, newest first.
    pub async fn list(&self, owner: Uuid) -> Result<Vec<Todo>, AppError> {
        self.store.list_by_owner(owner).await
    }

    /// [`list`](Self::list) narrowed by a search term and a status/category filter.
    pub async fn list_filtered(
        &self,
        owner: Uuid,
        term: &str,
        filter: &TodoFilter,
    ) -> Result<Vec<Todo>, AppError> {
        let todos = self.list(owner).await?;
        Ok(filter_todos(&todos, term, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Open todos whose reminder time has passed at `now`.
    pub async fn due_reminders(
        &self,
        owner: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Todo>, AppError> {
        let todos = self.list(owner).await?;
        Ok(todos
            .into_iter()
            .filter(|t| is_reminder_due(t, now))
            .collect())
    }

    pub async fn create(&self, owner: Uuid, req: CreateTodoRequest) -> Result<Todo, AppError> {
        let new = NewTodo::from(req);
        require_text("title", &new.title, "Title is required")?;

        let todo = self.store.insert(owner, new).await?;
        tracing::info!(owner = %owner, todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    /// Partial update: only fields present in `req` change.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        req: UpdateTodoRequest,
    ) -> Result<Todo, AppError> {
        let changes = TodoChanges::from(req);
        if let Some(title) = &changes.title {
            require_text("title", title, "Title cannot be empty")?;
        }

        let key = OwnedKey::new(id, owner);
        let todo = if changes.is_empty() {
            self.store.find_owned(key).await?
        } else {
            self.store.update_owned(key, changes).await?
        }
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;

        tracing::info!(owner = %owner, todo_id = %id, "Todo updated");
        Ok(todo)
    }

    /// Idempotent: removing a missing or foreign todo still succeeds.
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), AppError> {
        let removed = self.store.delete_owned(OwnedKey::new(id, owner)).await?;
        tracing::info!(owner = %owner, todo_id = %id, removed, "Todo deleted");
        Ok(())
    }

    pub async fn add_subtask(&self, owner: Uuid, id: Uuid, text: &str) -> Result<Todo, AppError> {
        let text = text.trim();
        require_text("text", text, "Subtask text is required")?;

        let subtask = Subtask::new(text);
        let subtask_id = subtask.id;
        let todo = self
            .store
            .push_subtask(OwnedKey::new(id, owner), subtask)
            .await?
            .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;

        tracing::info!(owner = %owner, todo_id = %id, subtask_id = %subtask_id, "Subtask added");
        Ok(todo)
    }

    pub async fn toggle_subtask(
        &self,
        owner: Uuid,
        id: Uuid,
        subtask_id: Uuid,
    ) -> Result<Todo, AppError> {
        match self
            .store
            .toggle_subtask(OwnedKey::new(id, owner), subtask_id)
            .await?
        {
            SubtaskToggle::Toggled(todo) => {
                tracing::info!(owner = %owner, todo_id = %id, subtask_id = %subtask_id, "Subtask toggled");
                Ok(todo)
            }
            SubtaskToggle::TodoMissing => Err(AppError::not_found(TODO_NOT_FOUND)),
            SubtaskToggle::SubtaskMissing => Err(AppError::not_found(SUBTASK_NOT_FOUND)),
        }
    }

    /// Removing an already-absent subtask is not an error; a missing todo is.
    pub async fn delete_subtask(
        &self,
        owner: Uuid,
        id: Uuid,
        subtask_id: Uuid,
    ) -> Result<Todo, AppError> {
        let todo = self
            .store
            .remove_subtask(OwnedKey::new(id, owner), subtask_id)
            .await?
            .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;

        tracing::info!(owner = %owner, todo_id = %id, subtask_id = %subtask_id, "Subtask deleted");
        Ok(todo)
    }
}

fn require_text(field: &str, value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, message));
    }
    Ok(())
}
