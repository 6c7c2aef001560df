//! Conversions from Redis failures into repository errors.

use crate::error::RepositoryError;
use deadpool_redis::CreatePoolError;

pub type RedisError = deadpool_redis::redis::RedisError;
pub type PoolError = deadpool_redis::PoolError;

impl From<RedisError> for RepositoryError {
    fn from(err: RedisError) -> Self {
        RepositoryError::Backend(format!("Redis error: {}", err))
    }
}

impl From<PoolError> for RepositoryError {
    fn from(err: PoolError) -> Self {
        RepositoryError::Backend(format!("Pool error: {}", err))
    }
}

impl From<CreatePoolError> for RepositoryError {
    fn from(err: CreatePoolError) -> Self {
        RepositoryError::Backend(format!("Create pool error: {}", err))
    }
}
