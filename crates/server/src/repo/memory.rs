//! In-process stores for tests and `STORE_BACKEND=memory` runs.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use shared_types::{AppError, Subtask, Todo, User};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    NewTodo, NewUser, OwnedKey, StoredUser, SubtaskToggle, TodoChanges, TodoStore, UserStore,
    DUPLICATE_EMAIL,
};

fn poisoned() -> AppError {
    AppError::internal("In-memory store lock poisoned")
}

#[derive(Default)]
pub struct MemoryTodoStore {
    todos: Mutex<Vec<Todo>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Todo>>, AppError> {
        self.todos.lock().map_err(|_| poisoned())
    }
}

/// The single lookup every mutator goes through.
fn find_owned_mut(todos: &mut [Todo], key: OwnedKey) -> Option<&mut Todo> {
    todos.iter_mut().find(|t| key.matches(t))
}

fn touch(todo: &mut Todo) {
    let now = Utc::now();
    // Keep updated_at strictly increasing even within one clock tick.
    todo.updated_at = if now > todo.updated_at {
        now
    } else {
        todo.updated_at + Duration::microseconds(1)
    };
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Todo>, AppError> {
        let todos = self.lock()?;
        // Insertion order is creation order, so reversing gives newest first.
        Ok(todos
            .iter()
            .rev()
            .filter(|t| t.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn insert(&self, owner: Uuid, todo: NewTodo) -> Result<Todo, AppError> {
        let now = Utc::now();
        let record = Todo {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: todo.title,
            description: todo.description,
            category: todo.category,
            priority: todo.priority,
            due_date: todo.due_date,
            reminder: todo.reminder,
            completed: todo.completed,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.lock()?.push(record.clone());
        Ok(record)
    }

    async fn find_owned(&self, key: OwnedKey) -> Result<Option<Todo>, AppError> {
        let mut todos = self.lock()?;
        Ok(find_owned_mut(&mut todos, key).map(|t| t.clone()))
    }

    async fn update_owned(
        &self,
        key: OwnedKey,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, AppError> {
        let mut todos = self.lock()?;
        Ok(find_owned_mut(&mut todos, key).map(|todo| {
            changes.apply(todo);
            touch(todo);
            todo.clone()
        }))
    }

    async fn delete_owned(&self, key: OwnedKey) -> Result<bool, AppError> {
        let mut todos = self.lock()?;
        let before = todos.len();
        todos.retain(|t| !key.matches(t));
        Ok(todos.len() < before)
    }

    async fn push_subtask(
        &self,
        key: OwnedKey,
        subtask: Subtask,
    ) -> Result<Option<Todo>, AppError> {
        let mut todos = self.lock()?;
        Ok(find_owned_mut(&mut todos, key).map(|todo| {
            todo.subtasks.push(subtask);
            touch(todo);
            todo.clone()
        }))
    }

    async fn toggle_subtask(
        &self,
        key: OwnedKey,
        subtask_id: Uuid,
    ) -> Result<SubtaskToggle, AppError> {
        let mut todos = self.lock()?;
        let Some(todo) = find_owned_mut(&mut todos, key) else {
            return Ok(SubtaskToggle::TodoMissing);
        };
        let Some(subtask) = todo.subtasks.iter_mut().find(|s| s.id == subtask_id) else {
            return Ok(SubtaskToggle::SubtaskMissing);
        };
        subtask.completed = !subtask.completed;
        touch(todo);
        Ok(SubtaskToggle::Toggled(todo.clone()))
    }

    async fn remove_subtask(
        &self,
        key: OwnedKey,
        subtask_id: Uuid,
    ) -> Result<Option<Todo>, AppError> {
        let mut todos = self.lock()?;
        Ok(find_owned_mut(&mut todos, key).map(|todo| {
            todo.subtasks.retain(|s| s.id != subtask_id);
            touch(todo);
            todo.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<StoredUser>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        if users.iter().any(|u| u.user.email == user.email) {
            return Err(AppError::conflict(DUPLICATE_EMAIL));
        }
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            created_at: Utc::now(),
        };
        users.push(StoredUser {
            user: record.clone(),
            password_hash: user.password_hash,
        });
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, AppError> {
        let users = self.users.lock().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.lock().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.user.id == id).map(|u| u.user.clone()))
    }
}
