//! Todo queries.
//!
//! Every query takes any [`PgExecutor`], so the same code runs against the pool, a single
//! connection or an open transaction (`&mut *tx`).

use async_trait::async_trait;
use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::application::repos::{RepoError, TodoQueryFilter, TodosRepo};
use crate::domain::entities::Todo;

use super::{PostgresRepositories, map_sqlx_error};

const INSERT_TODO_SQL: &str = "INSERT INTO todos (title, description, created_at, updated_at) \
    VALUES ($1, $2, $3, $4) RETURNING id";
const UPDATE_TODO_SQL: &str = "UPDATE todos SET title = $1, description = $2, completed = $3, \
    completed_at = $4, updated_at = $5 WHERE id = $6";
const SELECT_TODO_BY_ID_SQL: &str = "SELECT id, title, description, completed, completed_at, \
    created_at, updated_at FROM todos WHERE id = $1";
const LIST_TODOS_SQL: &str = "SELECT id, title, description, completed, completed_at, \
    created_at, updated_at FROM todos ORDER BY id";
const LIST_TODOS_PAGE_SQL: &str = "SELECT id, title, description, completed, completed_at, \
    created_at, updated_at FROM todos ORDER BY id LIMIT $1 OFFSET $2";
const COUNT_TODOS_SQL: &str = "SELECT COUNT(id) FROM todos";
const DELETE_TODO_SQL: &str = "DELETE FROM todos WHERE id = $1";

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: String,
    completed: bool,
    completed_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insert an unsaved todo or update an existing one, stamping its timestamps first.
pub async fn save<'e, E>(executor: E, todo: &mut Todo) -> Result<(), RepoError>
where
    E: PgExecutor<'e>,
{
    todo.touch();

    if todo.is_new() {
        let id = sqlx::query_scalar::<_, i64>(INSERT_TODO_SQL)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.created_at)
            .bind(todo.updated_at)
            .fetch_one(executor)
            .await
            .map_err(map_sqlx_error)?;
        todo.id = id;
        return Ok(());
    }

    sqlx::query(UPDATE_TODO_SQL)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.completed_at)
        .bind(todo.updated_at)
        .bind(todo.id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;

    Ok(())
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Todo, RepoError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TodoRow>(SELECT_TODO_BY_ID_SQL)
        .bind(id)
        .fetch_one(executor)
        .await
        .map(Todo::from)
        .map_err(map_sqlx_error)
}

/// Rows in id order, windowed only when both `page` and `per` are positive.
pub async fn list<'e, E>(executor: E, filter: &TodoQueryFilter) -> Result<Vec<Todo>, RepoError>
where
    E: PgExecutor<'e>,
{
    let rows = match filter.window()? {
        Some((limit, offset)) => {
            sqlx::query_as::<_, TodoRow>(LIST_TODOS_PAGE_SQL)
                .bind(limit)
                .bind(offset)
                .fetch_all(executor)
                .await
        }
        None => {
            sqlx::query_as::<_, TodoRow>(LIST_TODOS_SQL)
                .fetch_all(executor)
                .await
        }
    }
    .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(Todo::from).collect())
}

/// Total row count. Filters are not applied.
pub async fn count<'e, E>(executor: E, _filter: &TodoQueryFilter) -> Result<i64, RepoError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(COUNT_TODOS_SQL)
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<(), RepoError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(DELETE_TODO_SQL)
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

#[async_trait]
impl TodosRepo for PostgresRepositories {
    async fn save(&self, todo: &mut Todo) -> Result<(), RepoError> {
        save(self.pool(), todo).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Todo, RepoError> {
        find_by_id(self.pool(), id).await
    }

    async fn list(&self, filter: &TodoQueryFilter) -> Result<Vec<Todo>, RepoError> {
        list(self.pool(), filter).await
    }

    async fn count(&self, filter: &TodoQueryFilter) -> Result<i64, RepoError> {
        count(self.pool(), filter).await
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        delete(self.pool(), id).await
    }
}
