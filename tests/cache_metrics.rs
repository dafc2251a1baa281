use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use tokio::sync::Mutex;

use todo_api::application::repos::{RepoError, TodoQueryFilter, TodosRepo};
use todo_api::application::todos::{CreateTodoCommand, TodoService};
use todo_api::cache::{CacheFacade, MemoryStore};
use todo_api::domain::entities::Todo;

#[derive(Default)]
struct VecTodos {
    rows: Mutex<Vec<Todo>>,
}

#[async_trait]
impl TodosRepo for VecTodos {
    async fn save(&self, todo: &mut Todo) -> Result<(), RepoError> {
        todo.touch();
        let mut rows = self.rows.lock().await;
        if todo.is_new() {
            todo.id = rows.len() as i64 + 1;
            rows.push(todo.clone());
        } else if let Some(row) = rows.iter_mut().find(|row| row.id == todo.id) {
            *row = todo.clone();
        }
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Todo, RepoError> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn list(&self, _filter: &TodoQueryFilter) -> Result<Vec<Todo>, RepoError> {
        Ok(self.rows.lock().await.clone())
    }

    async fn count(&self, _filter: &TodoQueryFilter) -> Result<i64, RepoError> {
        Ok(self.rows.lock().await.len() as i64)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.rows.lock().await.retain(|row| row.id != id);
        Ok(())
    }
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let service = TodoService::new(
        CacheFacade::new(Arc::new(MemoryStore::new())),
        Arc::new(VecTodos::default()),
    );

    let todo = service
        .create(CreateTodoCommand {
            title: "metrics".into(),
            description: String::new(),
        })
        .await
        .expect("create");

    // hit
    service.find_by_id(todo.id).await.expect("cached read");
    // invalidate
    service.complete(todo.id).await.expect("complete");
    // miss
    assert!(service.find_by_id(todo.id + 1).await.is_err());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "todo_cache_hit_total",
        "todo_cache_miss_total",
        "todo_cache_invalidate_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
