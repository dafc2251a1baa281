//! Raw byte storage behind the cache facade.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::CacheError;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Minimal key/value capability the cache facade is built on.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Deleting an absent key succeeds.
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Round-trip to the backend, used by the health check.
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Process-local store. Entries live until removed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(rw_read(&self.entries, SOURCE, "exists").contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(rw_read(&self.entries, SOURCE, "get").get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "set").insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "del").remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
