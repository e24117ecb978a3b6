//! Validation and timestamping over a [`TodoStore`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};
use crate::model::{NewTodo, Todo, TodoPage, TodoPatch, TodoQuery};
use crate::store::TodoStore;

/// Owner-scoped todo operations shared by HTTP handlers.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    /// Wrap `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// Create an item for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Validation`] for blank text and store errors otherwise.
    #[instrument(name = "todo.create", skip(self, request))]
    pub async fn create(&self, owner: &str, request: NewTodo) -> TodoResult<Todo> {
        let text = require_text(request.text)?;
        let now = Utc::now();
        let todo = self
            .store
            .insert(Todo {
                id: Uuid::new_v4(),
                owner: owner.to_string(),
                text,
                completed: false,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    /// Fetch one of `owner`'s items.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`] when the item is absent or owned by
    /// someone else.
    pub async fn get(&self, owner: &str, id: Uuid) -> TodoResult<Todo> {
        self.store
            .get(owner, id)
            .await?
            .ok_or(TodoError::NotFound { id })
    }

    /// List `owner`'s items.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Validation`] for zero page or limit values.
    pub async fn list(&self, owner: &str, query: TodoQuery) -> TodoResult<TodoPage> {
        let query = query.normalised()?;
        let page = self.store.list(owner, &query).await?;
        debug!(owner, total = page.total, page = page.page, "todos listed");
        Ok(page)
    }

    /// Patch one of `owner`'s items.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`] when the item is absent or owned by
    /// someone else, and [`TodoError::Validation`] for blank replacement text.
    #[instrument(name = "todo.update", skip(self, patch))]
    pub async fn update(&self, owner: &str, id: Uuid, patch: TodoPatch) -> TodoResult<Todo> {
        let patch = TodoPatch {
            text: patch.text.map(require_text).transpose()?,
            completed: patch.completed,
        };
        self.store
            .update(owner, id, &patch, Utc::now())
            .await?
            .ok_or(TodoError::NotFound { id })
    }

    /// Delete one of `owner`'s items.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`] when the item is absent or owned by
    /// someone else.
    #[instrument(name = "todo.delete", skip(self))]
    pub async fn delete(&self, owner: &str, id: Uuid) -> TodoResult<()> {
        if self.store.delete(owner, id).await? {
            info!("todo deleted");
            Ok(())
        } else {
            Err(TodoError::NotFound { id })
        }
    }
}

fn require_text(text: String) -> TodoResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TodoError::Validation {
            field: "text",
            reason: "must not be empty",
        });
    }
    Ok(trimmed.to_string())
}
