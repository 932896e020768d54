//! Cache Backend Module
//!
//! The seam between the cache layer and a concrete key-value store.

use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a cache backend.
///
/// These never leave the cache layer; they only decide whether the backend is
/// still treated as reachable.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend has no live connection
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// The operation did not finish within its time budget
    #[error("cache operation timed out")]
    Timeout,

    /// The backend answered with an error
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Whether this failure means the backend should be considered down.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, CacheError::Unavailable(_) | CacheError::Timeout)
    }
}

/// A key-value store with TTL and prefix deletion.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl_secs` (always >= 1).
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every key starting with `prefix`, returning how many went.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Checks reachability, reconnecting if the backend supports it.
    async fn ping(&self) -> Result<(), CacheError>;
}
