//! Persistence contract for todo items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TodoResult;
use crate::model::{Todo, TodoPage, TodoPatch, TodoQuery};

/// Owner-scoped todo storage. Every method only sees items of `owner`.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Persist a fully built item.
    async fn insert(&self, todo: Todo) -> TodoResult<Todo>;

    /// Fetch one of the owner's items, returning `None` when absent.
    async fn get(&self, owner: &str, id: Uuid) -> TodoResult<Option<Todo>>;

    /// List an owner's items; `query` is already normalised.
    async fn list(&self, owner: &str, query: &TodoQuery) -> TodoResult<TodoPage>;

    /// Apply `patch` to the owner's item, returning `None` when absent.
    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> TodoResult<Option<Todo>>;

    /// Delete the owner's item, returning whether it existed.
    async fn delete(&self, owner: &str, id: Uuid) -> TodoResult<bool>;
}
