use async_trait::async_trait;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;

use super::{Counter, Store};
use crate::error::StoreError;
use crate::models::{Event, Registration};
use crate::redis_client::RedisClient;

// Раскладка ключей: один hash на сущность (id -> JSON) и счётчик id
pub const EVENTS_KEY: &str = "events";
pub const REGISTRATIONS_KEY: &str = "registrations";

pub fn counter_key(counter: Counter) -> &'static str {
    match counter {
        Counter::Event => "counter:events",
        Counter::Registration => "counter:registrations",
    }
}

#[derive(Clone)]
pub struct RedisStore {
    redis: RedisClient,
}

impl RedisStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    async fn get_one<T: DeserializeOwned>(&self, key: &str, id: i64) -> Result<Option<T>, StoreError> {
        let mut conn = self.redis.conn.clone();
        let raw: Option<String> = self.redis.run(conn.hget(key, id)).await?;
        raw.map(|data| serde_json::from_str(&data))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn get_all<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        let mut conn = self.redis.conn.clone();
        let raw: Vec<String> = self.redis.run(conn.hvals(key)).await?;
        raw.iter()
            .map(|data| serde_json::from_str(data).map_err(StoreError::from))
            .collect()
    }

    async fn put(&self, key: &str, id: i64, data: String) -> Result<(), StoreError> {
        let mut conn = self.redis.conn.clone();
        self.redis.run(conn.hset::<_, _, _, ()>(key, id, data)).await
    }

    async fn remove(&self, key: &str, ids: &[i64]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.redis.conn.clone();
        let removed: i64 = self.redis.run(conn.hdel(key, ids)).await?;
        Ok(removed.max(0) as usize)
    }
}

#[async_trait]
impl Store for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.conn.clone();
        let _: String = self.redis.run(redis::cmd("PING").query_async(&mut conn)).await?;
        Ok(())
    }

    async fn next_id(&self, counter: Counter) -> Result<i64, StoreError> {
        // INCR атомарен, так что id не повторяются даже между процессами
        let mut conn = self.redis.conn.clone();
        self.redis.run(conn.incr(counter_key(counter), 1)).await
    }

    async fn events(&self) -> Result<Vec<Event>, StoreError> {
        self.get_all(EVENTS_KEY).await
    }

    async fn event(&self, id: i64) -> Result<Option<Event>, StoreError> {
        self.get_one(EVENTS_KEY, id).await
    }

    async fn save_event(&self, event: &Event) -> Result<(), StoreError> {
        self.put(EVENTS_KEY, event.id, serde_json::to_string(event)?).await
    }

    async fn remove_event(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.remove(EVENTS_KEY, &[id]).await? > 0)
    }

    async fn registrations(&self) -> Result<Vec<Registration>, StoreError> {
        self.get_all(REGISTRATIONS_KEY).await
    }

    async fn registration(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        self.get_one(REGISTRATIONS_KEY, id).await
    }

    async fn save_registration(&self, registration: &Registration) -> Result<(), StoreError> {
        self.put(REGISTRATIONS_KEY, registration.id, serde_json::to_string(registration)?)
            .await
    }

    async fn remove_registrations(&self, ids: &[i64]) -> Result<usize, StoreError> {
        self.remove(REGISTRATIONS_KEY, ids).await
    }
}
