//! Redis-backed store using a `deadpool-redis` connection pool.

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, PoolConfig as PoolSizing, Runtime};
use redis::AsyncCommands;

use super::error::CacheError;
use super::store::KvStore;

#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build a pool for `url` holding at most `max_connections` connections.
    ///
    /// No connection is opened until the first command runs.
    pub fn connect(url: &str, max_connections: usize) -> Result<Self, CacheError> {
        let mut config = PoolConfig::from_url(url);
        config.pool = Some(PoolSizing::new(max_connections));
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| CacheError::backend(format!("failed to create redis pool: {err}")))?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| CacheError::backend(format!("failed to get redis connection: {err}")))
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        conn.exists(key).await.map_err(CacheError::backend)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(CacheError::backend)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(key, value).await.map_err(CacheError::backend)?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await.map_err(CacheError::backend)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(CacheError::backend)?;
        Ok(())
    }
}
