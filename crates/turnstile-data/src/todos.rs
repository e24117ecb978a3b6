//! `PostgreSQL` todo store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use turnstile_todo::{
    SortOrder, Todo, TodoError, TodoPage, TodoPatch, TodoQuery, TodoResult, TodoStore,
};
use uuid::Uuid;

use crate::error::DataError;

const INSERT_TODO: &str = r"
    INSERT INTO todos (id, owner, text, completed, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, owner, text, completed, created_at, updated_at
";

const SELECT_TODO: &str = r"
    SELECT id, owner, text, completed, created_at, updated_at
    FROM todos
    WHERE id = $1 AND owner = $2
";

const COUNT_TODOS: &str = r"
    SELECT COUNT(*) FROM todos
    WHERE owner = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)
";

const LIST_TODOS_ASC: &str = r"
    SELECT id, owner, text, completed, created_at, updated_at
    FROM todos
    WHERE owner = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)
    ORDER BY created_at ASC, id ASC
    LIMIT $3 OFFSET $4
";

const LIST_TODOS_DESC: &str = r"
    SELECT id, owner, text, completed, created_at, updated_at
    FROM todos
    WHERE owner = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)
    ORDER BY created_at DESC, id DESC
    LIMIT $3 OFFSET $4
";

const UPDATE_TODO: &str = r"
    UPDATE todos
    SET text = COALESCE($3, text),
        completed = COALESCE($4, completed),
        updated_at = $5
    WHERE id = $1 AND owner = $2
    RETURNING id, owner, text, completed, created_at, updated_at
";

const DELETE_TODO: &str = r"
    DELETE FROM todos WHERE id = $1 AND owner = $2
";

/// Todo store backed by the `todos` table.
#[derive(Clone)]
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    /// Wrap an already migrated pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: Uuid,
    owner: String,
    text: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            owner: row.owner,
            text: row.text,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn store_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> TodoError {
    move |source| TodoError::Store {
        operation,
        source: Box::new(DataError::query(operation, source)),
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn insert(&self, todo: Todo) -> TodoResult<Todo> {
        let row = sqlx::query_as::<_, TodoRow>(INSERT_TODO)
            .bind(todo.id)
            .bind(&todo.owner)
            .bind(&todo.text)
            .bind(todo.completed)
            .bind(todo.created_at)
            .bind(todo.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error("todos.insert"))?;
        Ok(row.into())
    }

    async fn get(&self, owner: &str, id: Uuid) -> TodoResult<Option<Todo>> {
        let row = sqlx::query_as::<_, TodoRow>(SELECT_TODO)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("todos.get"))?;
        Ok(row.map(Todo::from))
    }

    async fn list(&self, owner: &str, query: &TodoQuery) -> TodoResult<TodoPage> {
        let (total,): (i64,) = sqlx::query_as(COUNT_TODOS)
            .bind(owner)
            .bind(query.completed)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error("todos.count"))?;

        let statement = match query.sort {
            SortOrder::Asc => LIST_TODOS_ASC,
            SortOrder::Desc => LIST_TODOS_DESC,
        };
        let rows = sqlx::query_as::<_, TodoRow>(statement)
            .bind(owner)
            .bind(query.completed)
            .bind(i64::from(query.limit))
            .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("todos.list"))?;

        Ok(TodoPage::new(
            query,
            u64::try_from(total).unwrap_or_default(),
            rows.into_iter().map(Todo::from).collect(),
        ))
    }

    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> TodoResult<Option<Todo>> {
        let row = sqlx::query_as::<_, TodoRow>(UPDATE_TODO)
            .bind(id)
            .bind(owner)
            .bind(patch.text.as_deref())
            .bind(patch.completed)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("todos.update"))?;
        Ok(row.map(Todo::from))
    }

    async fn delete(&self, owner: &str, id: Uuid) -> TodoResult<bool> {
        let result = sqlx::query(DELETE_TODO)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(store_error("todos.delete"))?;
        Ok(result.rows_affected() == 1)
    }
}
