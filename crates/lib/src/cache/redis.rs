//! Redis cache backend
//!
//! Talks to Redis through a multiplexed [`ConnectionManager`], which
//! reconnects on its own after a dropped connection. Per-call time bounds are
//! applied by the typed caches, not here.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, ErrorKind, RedisError};

use crate::cache::{CacheBackend, CacheFault, FaultResult};

/// Keys requested per `SCAN` round-trip.
const SCAN_BATCH: usize = 100;

/// Classify a transport error.
pub fn classify(err: &RedisError) -> CacheFault {
    let message = err.to_string();
    if err.is_timeout() {
        CacheFault::timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        CacheFault::connection(message)
    } else if matches!(err.kind(), ErrorKind::TypeError | ErrorKind::ResponseError) {
        CacheFault::serialization(message)
    } else {
        CacheFault::other(message)
    }
}

fn manager_config(timeout: Duration) -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(timeout)
        .set_response_timeout(timeout)
}

/// A [`CacheBackend`] backed by a Redis server.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connect to `url`. Connection attempts and responses both give up after `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> FaultResult<Self> {
        let config = manager_config(timeout);

        let client = Client::open(url).map_err(|e| classify(&e))?;
        let connection = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(|e| classify(&e))?;

        tracing::info!("Redis cache connected");
        Ok(Self { connection })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn exists(&self, key: &str) -> FaultResult<bool> {
        self.conn().exists(key).await.map_err(|e| classify(&e))
    }

    async fn get(&self, key: &str) -> FaultResult<Option<String>> {
        self.conn().get(key).await.map_err(|e| classify(&e))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> FaultResult<()> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        self.conn()
            .pset_ex::<_, _, ()>(key, value, millis)
            .await
            .map_err(|e| classify(&e))
    }

    async fn delete(&self, key: &str) -> FaultResult<bool> {
        let removed: i64 = self.conn().del(key).await.map_err(|e| classify(&e))?;
        Ok(removed > 0)
    }

    async fn hash_put_all(&self, key: &str, entries: &[(String, i64)]) -> FaultResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.conn()
            .hset_multiple::<_, _, _, ()>(key, entries)
            .await
            .map_err(|e| classify(&e))
    }

    async fn hash_get_all(&self, key: &str) -> FaultResult<Vec<(String, i64)>> {
        let all: HashMap<String, i64> = self.conn().hgetall(key).await.map_err(|e| classify(&e))?;
        Ok(all.into_iter().collect())
    }

    async fn hash_field_exists(&self, key: &str, field: &str) -> FaultResult<bool> {
        self.conn()
            .hexists(key, field)
            .await
            .map_err(|e| classify(&e))
    }

    async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> FaultResult<i64> {
        self.conn()
            .hincr(key, field, delta)
            .await
            .map_err(|e| classify(&e))
    }

    async fn hash_set(&self, key: &str, field: &str, value: i64) -> FaultResult<()> {
        self.conn()
            .hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(|e| classify(&e))
    }

    async fn hash_fields(&self, key: &str) -> FaultResult<Vec<String>> {
        self.conn().hkeys(key).await.map_err(|e| classify(&e))
    }

    async fn scan(&self, pattern: &str) -> FaultResult<Vec<String>> {
        let mut conn = self.conn();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| classify(&e))?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once across batches.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn ping(&self) -> FaultResult<()> {
        let mut conn = self.conn();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| classify(&e))
    }
}
