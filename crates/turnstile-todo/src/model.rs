//! Todo items and list queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};

/// Page returned when the caller omits `page`.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size returned when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 5;
/// Largest page size served; larger requests are clamped.
pub const MAX_LIMIT: u32 = 100;

/// One owner-scoped todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Item id.
    pub id: Uuid,
    /// Identity that owns the item.
    pub owner: String,
    /// Item text.
    pub text: String,
    /// Completion flag.
    pub completed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Creation payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewTodo {
    /// Item text; must not be blank.
    pub text: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoPatch {
    /// Replacement text; must not be blank when present.
    pub text: Option<String>,
    /// Replacement completion flag.
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Apply the patch to `todo`, stamping `now` as the modification time.
    pub fn apply(&self, todo: &mut Todo, now: DateTime<Utc>) {
        if let Some(text) = &self.text {
            todo.text.clone_from(text);
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        todo.updated_at = now;
    }
}

/// Ordering on creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

/// Filter, sort, and page selection for listing an owner's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoQuery {
    /// Only items with this completion flag when set.
    pub completed: Option<bool>,
    /// Creation-time ordering.
    pub sort: SortOrder,
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for TodoQuery {
    fn default() -> Self {
        Self {
            completed: None,
            sort: SortOrder::Desc,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TodoQuery {
    /// Reject zero page/limit values and clamp the limit to [`MAX_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Validation`] when `page` or `limit` is zero.
    pub fn normalised(self) -> TodoResult<Self> {
        if self.page == 0 {
            return Err(TodoError::Validation {
                field: "page",
                reason: "must be at least 1",
            });
        }
        if self.limit == 0 {
            return Err(TodoError::Validation {
                field: "limit",
                reason: "must be at least 1",
            });
        }
        Ok(Self {
            limit: self.limit.min(MAX_LIMIT),
            ..self
        })
    }

    /// Number of items to skip before the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether `todo` passes the completion filter.
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        self.completed.is_none_or(|completed| todo.completed == completed)
    }
}

/// One page of an owner's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoPage {
    /// Items matching the filter across all pages.
    pub total: u64,
    /// Page served.
    pub page: u32,
    /// Page count: `ceil(total / limit)`.
    pub pages: u64,
    /// Items on this page.
    pub todos: Vec<Todo>,
}

impl TodoPage {
    /// Assemble a page for `query` from the filtered total and the page slice.
    #[must_use]
    pub fn new(query: &TodoQuery, total: u64, todos: Vec<Todo>) -> Self {
        Self {
            total,
            page: query.page,
            pages: total.div_ceil(u64::from(query.limit.max(1))),
            todos,
        }
    }
}
