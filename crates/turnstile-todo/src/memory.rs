//! In-memory todo store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::TodoResult;
use crate::model::{SortOrder, Todo, TodoPage, TodoPatch, TodoQuery};
use crate::store::TodoStore;

/// Process-local store keyed by item id.
#[derive(Default)]
pub struct MemoryTodoStore {
    items: RwLock<HashMap<Uuid, Todo>>,
}

impl MemoryTodoStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn insert(&self, todo: Todo) -> TodoResult<Todo> {
        self.items.write().await.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn get(&self, owner: &str, id: Uuid) -> TodoResult<Option<Todo>> {
        let items = self.items.read().await;
        Ok(items.get(&id).filter(|todo| todo.owner == owner).cloned())
    }

    async fn list(&self, owner: &str, query: &TodoQuery) -> TodoResult<TodoPage> {
        let items = self.items.read().await;
        let mut matching: Vec<&Todo> = items
            .values()
            .filter(|todo| todo.owner == owner && query.matches(todo))
            .collect();
        matching.sort_by(|left, right| {
            let order = left
                .created_at
                .cmp(&right.created_at)
                .then_with(|| left.id.cmp(&right.id));
            match query.sort {
                SortOrder::Asc => order,
                SortOrder::Desc => order.reverse(),
            }
        });

        let total = matching.len() as u64;
        let todos = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(TodoPage::new(query, total, todos))
    }

    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> TodoResult<Option<Todo>> {
        let mut items = self.items.write().await;
        Ok(items
            .get_mut(&id)
            .filter(|todo| todo.owner == owner)
            .map(|todo| {
                patch.apply(todo, now);
                todo.clone()
            }))
    }

    async fn delete(&self, owner: &str, id: Uuid) -> TodoResult<bool> {
        let mut items = self.items.write().await;
        if items.get(&id).is_some_and(|todo| todo.owner == owner) {
            items.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
