//! Key/value cache sitting in front of the todo store.
//!
//! Values are JSON-encoded and kept under string keys in a [`KvStore`]. Two backends exist:
//!
//! - **memory**: a process-local map, used by tests and single-node setups
//! - **redis**: a pooled Redis connection (`deadpool-redis`)
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! max_connections = 10
//! ```

mod config;
mod error;
mod facade;
mod keys;
mod lock;
mod redis_store;
mod store;

pub use config::{CacheBackend, build_store};
pub use error::CacheError;
pub use facade::CacheFacade;
pub use keys::todo_key;
pub use redis_store::RedisStore;
pub use store::{KvStore, MemoryStore};
