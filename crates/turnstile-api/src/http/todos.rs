//! Owner-scoped todo handlers; the owner is always the bearer's identity.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use turnstile_auth::Principal;
use turnstile_todo::{NewTodo, Todo, TodoPage, TodoPatch};
use uuid::Uuid;

use crate::http::errors::ApiError;
use crate::models::TodoListParams;
use crate::state::ApiState;

pub(crate) async fn list_todos(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<TodoListParams>,
) -> Result<Json<TodoPage>, ApiError> {
    let page = state
        .todos
        .list(&principal.identity, params.into())
        .await?;
    Ok(Json(page))
}

pub(crate) async fn create_todo(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state.todos.create(&principal.identity, request).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub(crate) async fn get_todo(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state.todos.get(&principal.identity, id).await?;
    Ok(Json(todo))
}

pub(crate) async fn update_todo(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TodoPatch>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state.todos.update(&principal.identity, id, patch).await?;
    Ok(Json(todo))
}

pub(crate) async fn delete_todo(
    State(state): State<Arc<ApiState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.todos.delete(&principal.identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
