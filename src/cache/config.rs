//! Cache backend selection.

use std::sync::Arc;

use clap::ValueEnum;
use serde::Deserialize;

use crate::config::CacheSettings;

use super::error::CacheError;
use super::redis_store::RedisStore;
use super::store::{KvStore, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

/// Instantiate the configured backend.
pub fn build_store(settings: &CacheSettings) -> Result<Arc<dyn KvStore>, CacheError> {
    match settings.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        CacheBackend::Redis => {
            let url = settings
                .redis_url
                .as_deref()
                .ok_or_else(|| CacheError::backend("redis backend requires a redis_url"))?;
            let store = RedisStore::connect(url, settings.max_connections.get() as usize)?;
            Ok(Arc::new(store))
        }
    }
}
