//! Persistence for todos and accounts.
//!
//! Every operation on an existing todo is addressed by [`OwnedKey`], the
//! `(id, owner)` pair. There is deliberately no id-only accessor: a todo
//! that belongs to someone else is indistinguishable from one that does
//! not exist.

pub mod memory;
pub mod todo;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{AppError, CreateTodoRequest, Subtask, Todo, UpdateTodoRequest, User};
use uuid::Uuid;

pub use memory::{MemoryTodoStore, MemoryUserStore};
pub use todo::PgTodoStore;
pub use user::PgUserStore;

/// Compound lookup key for a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnedKey {
    pub id: Uuid,
    pub owner: Uuid,
}

impl OwnedKey {
    pub fn new(id: Uuid, owner: Uuid) -> Self {
        Self { id, owner }
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        todo.id == self.id && todo.owner_id == self.owner
    }
}

/// Fields of a todo about to be inserted. Id, owner and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl From<CreateTodoRequest> for NewTodo {
    fn from(req: CreateTodoRequest) -> Self {
        Self {
            title: req.title.trim().to_string(),
            description: req.description,
            category: req.category,
            priority: req.priority,
            due_date: req.due_date,
            reminder: req.reminder,
            completed: req.completed,
        }
    }
}

/// Partial update. `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub priority: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub reminder: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        *self == TodoChanges::default()
    }

    /// Apply to an in-memory record. Stores backed by SQL express the same
    /// rules in the `UPDATE` statement.
    pub fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(category) = self.category {
            todo.category = category;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = due_date;
        }
        if let Some(reminder) = self.reminder {
            todo.reminder = reminder;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

impl From<UpdateTodoRequest> for TodoChanges {
    fn from(req: UpdateTodoRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            category: req.category,
            priority: req.priority,
            due_date: req.due_date,
            reminder: req.reminder,
            completed: req.completed,
        }
    }
}

/// Result of flipping a subtask, keeping the two miss cases apart.
#[derive(Debug, Clone, PartialEq)]
pub enum SubtaskToggle {
    Toggled(Todo),
    TodoMissing,
    SubtaskMissing,
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Cheap connectivity check for `/health`.
    async fn ping(&self) -> Result<(), AppError>;

    /// All todos of `owner`, newest first.
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Todo>, AppError>;

    async fn insert(&self, owner: Uuid, todo: NewTodo) -> Result<Todo, AppError>;

    async fn find_owned(&self, key: OwnedKey) -> Result<Option<Todo>, AppError>;

    async fn update_owned(
        &self,
        key: OwnedKey,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, AppError>;

    /// Returns true if a record was removed.
    async fn delete_owned(&self, key: OwnedKey) -> Result<bool, AppError>;

    /// Append to the end of the subtask list. Concurrent appends must all survive.
    async fn push_subtask(&self, key: OwnedKey, subtask: Subtask)
        -> Result<Option<Todo>, AppError>;

    async fn toggle_subtask(
        &self,
        key: OwnedKey,
        subtask_id: Uuid,
    ) -> Result<SubtaskToggle, AppError>;

    /// Remove a subtask if present. `None` only when the todo itself is missing.
    async fn remove_subtask(
        &self,
        key: OwnedKey,
        subtask_id: Uuid,
    ) -> Result<Option<Todo>, AppError>;
}

/// Account data needed to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A user row including the credential hash. Never serialized.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

/// Message used for a duplicate-email conflict by every `UserStore`.
pub(crate) const DUPLICATE_EMAIL: &str = "An account with this email already exists";
