//! Typed JSON cache over a raw [`KvStore`].

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::error::CacheError;
use super::store::KvStore;

const SOURCE: &str = "cache::facade";

#[derive(Clone)]
pub struct CacheFacade {
    store: Arc<dyn KvStore>,
}

impl CacheFacade {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Encode `value` as JSON and store it under `key`, replacing any previous entry.
    pub async fn put<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + Sync,
    {
        let encoded = serde_json::to_vec(value)?;
        self.store.set(key, encoded).await?;
        debug!(source = SOURCE, key, "cache entry stored");
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key).await
    }

    /// Fetch and decode the entry under `key`.
    ///
    /// Returns [`CacheError::Miss`] when nothing is stored there.
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        match self.store.get(key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Err(CacheError::Miss {
                key: key.to_string(),
            }),
        }
    }

    pub async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.store.del(key).await?;
        debug!(source = SOURCE, key, "cache entry removed");
        Ok(())
    }
}
