//! Todo workflow: validation, persistence and cache maintenance around each operation.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::application::pagination::Pagination;
use crate::application::repos::{RepoError, TodoQueryFilter, TodosRepo};
use crate::cache::{CacheError, CacheFacade, todo_key};
use crate::domain::entities::Todo;
use crate::domain::error::DomainError;
use crate::domain::names::validate_single_name;

pub const METRIC_CACHE_HIT_TOTAL: &str = "todo_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "todo_cache_miss_total";
pub const METRIC_CACHE_INVALIDATE_TOTAL: &str = "todo_cache_invalidate_total";

#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("todo has been marked as complete")]
    AlreadyCompleted,
    #[error("cannot delete a todo that has been completed")]
    CompletedConflict,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl TodoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(RepoError::NotFound))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::AlreadyCompleted => "already_completed",
            Self::CompletedConflict => "completed_conflict",
            Self::Repo(RepoError::NotFound) => "not_found",
            Self::Repo(_) => "store_error",
            Self::Cache(CacheError::Serialization(_)) => "serialization_error",
            Self::Cache(_) => "cache_error",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTodoCommand {
    pub title: String,
    pub description: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodoCommand {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct TodoService {
    cache: CacheFacade,
    todos: Arc<dyn TodosRepo>,
}

impl TodoService {
    pub fn new(cache: CacheFacade, todos: Arc<dyn TodosRepo>) -> Self {
        Self { cache, todos }
    }

    #[instrument(skip(self, command))]
    pub async fn create(&self, command: CreateTodoCommand) -> Result<Todo, TodoError> {
        validate_single_name(&command.title)?;

        let mut todo = Todo::new(command.title, "");
        if !command.description.trim().is_empty() {
            todo.description = command.description;
        }

        self.todos.save(&mut todo).await?;
        self.cache.put(&todo_key(todo.id), &todo).await?;

        info!(target = "todo_api::todos", todo_id = todo.id, "Created todo");
        Ok(todo)
    }

    /// Cached copies are returned as-is; a store read does not repopulate the cache.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Todo, TodoError> {
        self.load(id).await
    }

    #[instrument(skip(self, command))]
    pub async fn update(&self, id: i64, command: UpdateTodoCommand) -> Result<Todo, TodoError> {
        let mut todo = self.load(id).await?;

        if let Some(title) = command.title {
            validate_single_name(&title)?;
            todo.title = title;
        }

        if let Some(description) = command.description
            && !description.trim().is_empty()
        {
            todo.description = description;
        }

        self.todos.save(&mut todo).await?;
        self.refresh_cache(&todo).await?;

        info!(target = "todo_api::todos", todo_id = todo.id, "Updated todo");
        Ok(todo)
    }

    #[instrument(skip(self))]
    pub async fn complete(&self, id: i64) -> Result<Todo, TodoError> {
        let mut todo = self.load(id).await?;
        if todo.completed {
            return Err(TodoError::AlreadyCompleted);
        }

        todo.mark_completed();
        self.todos.save(&mut todo).await?;
        self.refresh_cache(&todo).await?;

        info!(target = "todo_api::todos", todo_id = todo.id, "Completed todo");
        Ok(todo)
    }

    /// The cache entry is dropped before the row is removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), TodoError> {
        let todo = self.load(id).await?;
        if todo.completed {
            return Err(TodoError::CompletedConflict);
        }

        self.invalidate(todo.id).await?;
        self.todos.delete(todo.id).await?;

        info!(target = "todo_api::todos", todo_id = todo.id, "Deleted todo");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &TodoQueryFilter) -> Result<TodoList, TodoError> {
        let todos = self.todos.list(filter).await?;
        let count = self.todos.count(filter).await?;

        Ok(TodoList {
            todos,
            pagination: Pagination::new(count, filter.page, filter.per),
        })
    }

    async fn load(&self, id: i64) -> Result<Todo, TodoError> {
        let key = todo_key(id);
        if self.cache.exists(&key).await? {
            counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
            debug!(target = "todo_api::todos", todo_id = id, "Serving todo from cache");
            return Ok(self.cache.get(&key).await?);
        }

        counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
        Ok(self.todos.find_by_id(id).await?)
    }

    async fn refresh_cache(&self, todo: &Todo) -> Result<(), TodoError> {
        self.invalidate(todo.id).await?;
        self.cache.put(&todo_key(todo.id), todo).await?;
        Ok(())
    }

    async fn invalidate(&self, id: i64) -> Result<(), TodoError> {
        self.cache.remove(&todo_key(id)).await?;
        counter!(METRIC_CACHE_INVALIDATE_TOTAL).increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::{KvStore, MemoryStore};

    #[derive(Default)]
    struct InMemoryTodos {
        rows: Mutex<Vec<Todo>>,
        fail_writes: Mutex<bool>,
    }

    impl InMemoryTodos {
        fn stored(&self, id: i64) -> Option<Todo> {
            self.rows.lock().unwrap().iter().find(|t| t.id == id).cloned()
        }

        fn fail_writes(&self) {
            *self.fail_writes.lock().unwrap() = true;
        }

        fn check_writable(&self) -> Result<(), RepoError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(RepoError::from_persistence("store unavailable"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TodosRepo for InMemoryTodos {
        async fn save(&self, todo: &mut Todo) -> Result<(), RepoError> {
            self.check_writable()?;
            todo.touch();
            let mut rows = self.rows.lock().unwrap();
            if todo.is_new() {
                todo.id = rows.iter().map(|t| t.id).max().unwrap_or(0) + 1;
                rows.push(todo.clone());
            } else if let Some(row) = rows.iter_mut().find(|t| t.id == todo.id) {
                *row = todo.clone();
            }
            Ok(())
        }

        async fn find_by_id(&self, id: i64) -> Result<Todo, RepoError> {
            self.stored(id).ok_or(RepoError::NotFound)
        }

        async fn list(&self, filter: &TodoQueryFilter) -> Result<Vec<Todo>, RepoError> {
            let rows = self.rows.lock().unwrap();
            Ok(match filter.window()? {
                Some((limit, offset)) => rows
                    .iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .cloned()
                    .collect(),
                None => rows.clone(),
            })
        }

        async fn count(&self, _filter: &TodoQueryFilter) -> Result<i64, RepoError> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn delete(&self, id: i64) -> Result<(), RepoError> {
            self.check_writable()?;
            self.rows.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }

    struct Harness {
        service: TodoService,
        repo: Arc<InMemoryTodos>,
        store: Arc<MemoryStore>,
    }

    fn harness() -> Harness {
        let repo = Arc::new(InMemoryTodos::default());
        let store = Arc::new(MemoryStore::new());
        let service = TodoService::new(CacheFacade::new(store.clone()), repo.clone());
        Harness {
            service,
            repo,
            store,
        }
    }

    fn create(title: &str, description: &str) -> CreateTodoCommand {
        CreateTodoCommand {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    async fn cached(store: &MemoryStore, id: i64) -> Option<Todo> {
        store
            .get(&todo_key(id))
            .await
            .unwrap()
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn create_persists_and_caches() {
        let h = harness();
        let todo = h.service.create(create("groceries", "milk")).await.unwrap();

        assert_eq!(todo.id, 1);
        assert!(!todo.completed);
        assert!(todo.completed_at.is_none());
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(h.repo.stored(1), Some(todo.clone()));
        assert_eq!(cached(&h.store, 1).await, Some(todo));
    }

    #[tokio::test]
    async fn create_rejects_invalid_titles() {
        let h = harness();
        let err = h.service.create(create("", "x")).await.unwrap_err();
        assert_eq!(err.to_string(), "name cannot be empty");

        let err = h
            .service
            .create(create(&"a".repeat(51), ""))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::Validation(_)));
        assert_eq!(err.code(), "validation_error");
        assert!(h.store.is_empty());

        assert!(h.service.create(create(&"a".repeat(50), "")).await.is_ok());
    }

    #[tokio::test]
    async fn create_drops_blank_description() {
        let h = harness();
        let todo = h.service.create(create("groceries", "   ")).await.unwrap();
        assert_eq!(todo.description, "");
    }

    #[tokio::test]
    async fn find_round_trips_created_todo() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();
        let found = h.service.find_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn find_serves_stale_cache_entry() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();

        let mut stale = created.clone();
        stale.title = "stale".into();
        CacheFacade::new(h.store.clone())
            .put(&todo_key(created.id), &stale)
            .await
            .unwrap();

        let found = h.service.find_by_id(created.id).await.unwrap();
        assert_eq!(found.title, "stale");
    }

    #[tokio::test]
    async fn find_miss_does_not_populate_cache() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();
        h.store.del(&todo_key(created.id)).await.unwrap();

        let found = h.service.find_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
        assert!(cached(&h.store, created.id).await.is_none());
    }

    #[tokio::test]
    async fn find_unknown_id_is_not_found() {
        let h = harness();
        let err = h.service.find_by_id(99).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn update_title_only_keeps_description() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();

        let updated = h
            .service
            .update(
                created.id,
                UpdateTodoCommand {
                    title: Some("shopping".into()),
                    description: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "shopping");
        assert_eq!(updated.description, "milk");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(cached(&h.store, created.id).await, Some(updated.clone()));
        assert_eq!(h.repo.stored(created.id), Some(updated));
    }

    #[tokio::test]
    async fn update_ignores_blank_description() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();

        let updated = h
            .service
            .update(
                created.id,
                UpdateTodoCommand {
                    title: None,
                    description: Some("  ".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "milk");
    }

    #[tokio::test]
    async fn update_revalidates_title() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();

        let err = h
            .service
            .update(
                created.id,
                UpdateTodoCommand {
                    title: Some(String::new()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::Validation(_)));
        assert_eq!(h.repo.stored(created.id).unwrap().title, "groceries");
    }

    #[tokio::test]
    async fn update_from_store_when_cache_is_cold() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();
        h.store.del(&todo_key(created.id)).await.unwrap();

        let updated = h
            .service
            .update(
                created.id,
                UpdateTodoCommand {
                    title: None,
                    description: Some("bread".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(cached(&h.store, created.id).await, Some(updated));
    }

    #[tokio::test]
    async fn failed_save_leaves_cache_untouched() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();
        h.repo.fail_writes();

        let err = h
            .service
            .update(
                created.id,
                UpdateTodoCommand {
                    title: Some("shopping".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "store_error");
        assert_eq!(cached(&h.store, created.id).await, Some(created));
    }

    #[tokio::test]
    async fn complete_once_then_rejects() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let completed = h.service.complete(created.id).await.unwrap();
        assert!(completed.completed);
        assert!(completed.completed_at.is_some());
        assert!(completed.updated_at > created.updated_at);
        assert_eq!(cached(&h.store, created.id).await, Some(completed.clone()));

        let err = h.service.complete(created.id).await.unwrap_err();
        assert_eq!(err.to_string(), "todo has been marked as complete");
        assert_eq!(
            h.repo.stored(created.id).unwrap().completed_at,
            completed.completed_at
        );
    }

    #[tokio::test]
    async fn delete_removes_cache_and_row() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();

        h.service.delete(created.id).await.unwrap();

        assert!(h.repo.stored(created.id).is_none());
        assert!(cached(&h.store, created.id).await.is_none());
        assert!(h.service.find_by_id(created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_completed_todo_is_rejected() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();
        h.service.complete(created.id).await.unwrap();

        let err = h.service.delete(created.id).await.unwrap_err();
        assert!(matches!(err, TodoError::CompletedConflict));
        assert_eq!(
            err.to_string(),
            "cannot delete a todo that has been completed"
        );
        assert!(h.repo.stored(created.id).is_some());
        assert!(cached(&h.store, created.id).await.is_some());
    }

    #[tokio::test]
    async fn delete_drops_cache_before_touching_store() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();
        h.repo.fail_writes();

        assert!(h.service.delete(created.id).await.is_err());
        assert!(cached(&h.store, created.id).await.is_none());
        assert!(h.repo.stored(created.id).is_some());
    }

    #[tokio::test]
    async fn list_pages_in_creation_order() {
        let h = harness();
        let first = h.service.create(create("first", "")).await.unwrap();
        let second = h.service.create(create("second", "")).await.unwrap();

        let page_one = h.service.list(&TodoQueryFilter::new(1, 1)).await.unwrap();
        assert_eq!(page_one.todos, vec![first]);
        assert_eq!(page_one.pagination.count, 2);
        assert_eq!(page_one.pagination.num_pages, 2);
        assert_eq!(page_one.pagination.next_page, Some(2));

        let page_two = h.service.list(&TodoQueryFilter::new(2, 1)).await.unwrap();
        assert_eq!(page_two.todos, vec![second]);
        assert_eq!(page_two.pagination.prev_page, Some(1));
        assert_eq!(page_two.pagination.next_page, None);
    }

    #[tokio::test]
    async fn list_of_empty_store_has_one_page() {
        let h = harness();
        let list = h.service.list(&TodoQueryFilter::new(1, 20)).await.unwrap();
        assert!(list.todos.is_empty());
        assert_eq!(list.pagination.num_pages, 1);
    }

    #[tokio::test]
    async fn list_with_out_of_range_page_is_an_error() {
        let h = harness();
        h.service.create(create("first", "")).await.unwrap();

        let err = h
            .service
            .list(&TodoQueryFilter::new(i64::MAX, 2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TodoError::Repo(RepoError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn undecodable_cache_entry_surfaces_serialization_error() {
        let h = harness();
        let created = h.service.create(create("groceries", "milk")).await.unwrap();
        h.store
            .set(&todo_key(created.id), b"{".to_vec())
            .await
            .unwrap();

        let err = h.service.find_by_id(created.id).await.unwrap_err();
        assert_eq!(err.code(), "serialization_error");
    }
}
