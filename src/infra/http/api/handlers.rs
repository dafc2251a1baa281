use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use super::error::ApiError;
use super::models::{
    CreateTodoRequest, DeleteTodoResponse, TodoListQuery, UpdateTodoRequest, parse_todo_id,
};
use super::state::ApiState;

pub async fn create_todo(
    State(state): State<ApiState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let todo = state.todos.create(payload.into()).await?;
    Ok(Json(todo))
}

pub async fn list_todos(
    State(state): State<ApiState>,
    Query(query): Query<TodoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.into_filter()?;
    let list = state.todos.list(&filter).await?;
    Ok(Json(list))
}

pub async fn get_todo(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = state.todos.find_by_id(id).await?;
    Ok(Json(todo))
}

pub async fn update_todo(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let id = parse_todo_id(&id)?;
    let todo = state.todos.update(id, payload.into()).await?;
    Ok(Json(todo))
}

pub async fn complete_todo(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = state.todos.complete(id).await?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_todo_id(&id)?;
    state.todos.delete(id).await?;
    Ok(Json(DeleteTodoResponse { success: true }))
}
