//! Persistence backends.
//!
//! `Store` is the capability set the repositories need: id counters plus
//! get/list/save/remove for events and registrations. Two implementations
//! exist: Redis hashes ([`redis::RedisStore`]) and flat JSON files
//! ([`file::FileStore`]). Which one is used is decided by
//! `STORAGE_BACKEND` at startup.
//!
//! Neither backend offers multi-record transactions. A registration write
//! and the attendee update that follows it are two separate operations.

pub mod file;
pub mod redis;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::error::StoreError;
use crate::models::{Event, Registration};
use crate::redis_client::RedisClient;

/// Monotonic id sequence per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Event,
    Registration,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Advances the counter and returns the new value (first id is 1).
    async fn next_id(&self, counter: Counter) -> Result<i64, StoreError>;

    async fn events(&self) -> Result<Vec<Event>, StoreError>;
    async fn event(&self, id: i64) -> Result<Option<Event>, StoreError>;
    /// Insert or overwrite by id.
    async fn save_event(&self, event: &Event) -> Result<(), StoreError>;
    async fn remove_event(&self, id: i64) -> Result<bool, StoreError>;

    async fn registrations(&self) -> Result<Vec<Registration>, StoreError>;
    async fn registration(&self, id: i64) -> Result<Option<Registration>, StoreError>;
    async fn save_registration(&self, registration: &Registration) -> Result<(), StoreError>;
    /// Removes every listed registration, returns how many existed.
    async fn remove_registrations(&self, ids: &[i64]) -> Result<usize, StoreError>;
}

pub type SharedStore = Arc<dyn Store>;

/// Builds the backend selected in `config`.
pub async fn connect(config: &Config) -> Result<SharedStore, StoreError> {
    match config.storage.backend {
        StorageBackend::File => {
            let store = file::FileStore::open(&config.storage.data_dir).await?;
            info!("Using flat-file storage in {}", config.storage.data_dir.display());
            Ok(Arc::new(store))
        }
        StorageBackend::Redis => {
            let url = config.redis.url.as_deref().ok_or_else(|| {
                ::redis::RedisError::from((::redis::ErrorKind::InvalidClientConfig, "REDIS_URL is not set"))
            })?;
            let client = RedisClient::new(url, config.redis.timeout()).await?;
            info!("Using redis storage");
            Ok(Arc::new(redis::RedisStore::new(client)))
        }
    }
}
