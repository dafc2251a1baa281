//! Redis backend checks against a throwaway container.

use std::sync::Arc;

use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;

use todo_api::cache::{CacheError, CacheFacade, KvStore, RedisStore, todo_key};
use todo_api::domain::entities::Todo;

async fn start_redis() -> (ContainerAsync<Redis>, RedisStore) {
    let container = Redis::default()
        .start()
        .await
        .expect("redis container should start");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("redis port should be mapped");

    let store = RedisStore::connect(&format!("redis://127.0.0.1:{port}"), 4)
        .expect("redis pool should build");
    (container, store)
}

#[tokio::test]
async fn ping_answers() {
    let (_container, store) = start_redis().await;
    store.ping().await.expect("ping succeeds");
}

#[tokio::test]
async fn set_get_exists_and_del() {
    let (_container, store) = start_redis().await;

    assert!(!store.exists("k").await.expect("exists"));
    assert_eq!(store.get("k").await.expect("get"), None);

    store.set("k", b"first".to_vec()).await.expect("set");
    assert!(store.exists("k").await.expect("exists"));
    assert_eq!(store.get("k").await.expect("get"), Some(b"first".to_vec()));

    store.set("k", b"second".to_vec()).await.expect("overwrite");
    assert_eq!(store.get("k").await.expect("get"), Some(b"second".to_vec()));

    store.del("k").await.expect("del");
    store.del("k").await.expect("second del is not an error");
    assert!(!store.exists("k").await.expect("exists"));
}

#[tokio::test]
async fn facade_round_trips_a_todo() {
    let (_container, store) = start_redis().await;
    let cache = CacheFacade::new(Arc::new(store.clone()));

    let mut todo = Todo::new("groceries", "milk");
    todo.touch();
    todo.id = 7;
    let key = todo_key(todo.id);

    cache.put(&key, &todo).await.expect("put");
    assert!(cache.exists(&key).await.expect("exists"));
    let loaded: Todo = cache.get(&key).await.expect("get");
    assert_eq!(loaded, todo);

    let raw = store.get(&key).await.expect("raw get").expect("raw bytes");
    let json: serde_json::Value = serde_json::from_slice(&raw).expect("stored as json");
    assert_eq!(json["title"], "groceries");

    cache.remove(&key).await.expect("remove");
    cache.remove(&key).await.expect("remove is idempotent");
    let err = cache.get::<Todo>(&key).await.unwrap_err();
    assert!(matches!(err, CacheError::Miss { .. }));
}

#[tokio::test]
async fn concurrent_writes_share_the_pool() {
    let (_container, store) = start_redis().await;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .set(&todo_key(i), i.to_string().into_bytes())
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("task joins").expect("set succeeds");
    }
    for i in 0..8 {
        assert_eq!(
            store.get(&todo_key(i)).await.expect("get"),
            Some(i.to_string().into_bytes())
        );
    }
}

#[tokio::test]
async fn unreachable_server_is_a_backend_error() {
    let store = RedisStore::connect("redis://127.0.0.1:1", 1).expect("pool builds lazily");
    let err = store.ping().await.unwrap_err();
    assert!(matches!(err, CacheError::Backend(_)));
}
