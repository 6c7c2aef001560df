//! Redis connection pool.

use crate::error::RepositoryError;
use deadpool_redis::{Config, Connection, Pool, Runtime};

/// Redis-backed adapter for the video and user repositories.
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl RedisPool {
    /// Create a new RedisPool. Connections are opened lazily.
    pub fn new(redis_url: &str) -> Result<Self, RepositoryError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    pub(super) async fn connection(&self) -> Result<Connection, RepositoryError> {
        Ok(self.pool.get().await?)
    }
}
