use redis::{aio::MultiplexedConnection, Client, RedisResult};
use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

/// Redis connection owned by the application state. Every command goes
/// through [`RedisClient::run`], which enforces a fixed timeout.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
    timeout: Duration,
}

impl RedisClient {
    pub async fn new(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let conn = with_timeout(timeout, client.get_multiplexed_tokio_connection()).await?;
        Ok(RedisClient { conn, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        with_timeout(self.timeout, op).await
    }
}

// Зависание Redis превращаем в быструю ошибку
async fn with_timeout<T, F>(timeout: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}
