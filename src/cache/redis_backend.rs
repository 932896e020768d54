//! Redis Cache Backend
//!
//! Uses a `ConnectionManager` with bounded connection and response timeouts
//! and a single retry. If the first connect fails the backend stays
//! disconnected and `ping` tries again, so reconnects happen on the liveness
//! probe's schedule instead of inside a request.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::backend::{CacheBackend, CacheError};

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 100;

pub struct RedisBackend {
    client: redis::Client,
    connect_timeout: Duration,
    response_timeout: Duration,
    conn: RwLock<Option<ConnectionManager>>,
}

impl RedisBackend {
    /// Validates the URL. No connection is made until [`RedisBackend::connect`]
    /// or the first `ping`.
    pub fn open(
        url: &str,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        Ok(Self {
            client,
            connect_timeout,
            response_timeout,
            conn: RwLock::new(None),
        })
    }

    /// Establishes the managed connection, bounded by the connect timeout.
    pub async fn connect(&self) -> Result<(), CacheError> {
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(self.connect_timeout)
            .set_response_timeout(self.response_timeout)
            .set_number_of_retries(1);

        let manager = tokio::time::timeout(
            self.connect_timeout,
            ConnectionManager::new_with_config(self.client.clone(), config),
        )
        .await
        .map_err(|_| CacheError::Timeout)?
        .map_err(map_redis_error)?;

        *self.conn.write().await = Some(manager);
        info!("Connected to redis cache");
        Ok(())
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.conn
            .read()
            .await
            .clone()
            .ok_or_else(|| CacheError::Unavailable("not connected".to_string()))
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.set_ex(key, value, ttl_secs.max(1))
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del(key).await.map_err(map_redis_error)
    }

    /// Walks the keyspace with `SCAN` and unlinks each matching batch.
    /// A failure midway leaves the remaining keys to expire by TTL.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;

            if !keys.is_empty() {
                let count: u64 = redis::cmd("UNLINK")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(map_redis_error)?;
                removed += count;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(prefix, removed, "Deleted cache keys by prefix");
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        if self.conn.read().await.is_none() {
            self.connect().await?;
        }
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

fn map_redis_error(err: RedisError) -> CacheError {
    if err.is_timeout() {
        CacheError::Timeout
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::Backend(err.to_string())
    }
}

/// Escapes glob metacharacters so a prefix matches literally in `SCAN MATCH`.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
