//! Stateless derivations over a list of todos: search, status/category
//! filtering, counters, and reminder detection. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::todo::Todo;

/// Which todos a list view shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
    /// Exact match on the free-form category label.
    Category(String),
}

impl TodoFilter {
    /// Parse the client's single filter selector. Anything that is not
    /// `all`, `active` or `completed` is taken as a category label.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "all" => TodoFilter::All,
            "active" => TodoFilter::Active,
            "completed" => TodoFilter::Completed,
            other => TodoFilter::Category(other.to_string()),
        }
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Active => !todo.completed,
            TodoFilter::Completed => todo.completed,
            TodoFilter::Category(cat) => todo.category.as_deref() == Some(cat.as_str()),
        }
    }
}

/// Case-insensitive substring match on title or description.
/// An empty term matches everything.
pub fn matches_search(todo: &Todo, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    todo.title.to_lowercase().contains(&needle)
        || todo
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false)
}

/// Apply search and filter, preserving input order.
pub fn filter_todos<'a>(todos: &'a [Todo], term: &str, filter: &TodoFilter) -> Vec<&'a Todo> {
    todos
        .iter()
        .filter(|t| matches_search(t, term) && filter.matches(t))
        .collect()
}

/// A reminder is due once its time has passed, until the todo is completed.
pub fn is_reminder_due(todo: &Todo, now: DateTime<Utc>) -> bool {
    match todo.reminder {
        Some(at) => at <= now && !todo.completed,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TodoStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TodoStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let completed = todos.iter().filter(|t| t.completed).count();
        Self {
            total: todos.len(),
            active: todos.len() - completed,
            completed,
        }
    }
}
