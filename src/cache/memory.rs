//! In-Memory Cache Backend
//!
//! Process-local TTL store used when no Redis URL is configured. Keys live in
//! a sorted map so prefix deletion is a range scan.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{CacheBackend, CacheError};
use super::entry::{current_timestamp_ms, CacheEntry};

// == Memory Cache Store ==
/// TTL key-value storage with a capacity bound.
#[derive(Debug)]
pub struct MemoryCacheStore {
    entries: BTreeMap<String, CacheEntry>,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl MemoryCacheStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous entry under the same key.
    ///
    /// When full, expired entries are purged first; if none were expired the
    /// entry closest to expiry is evicted.
    pub fn set(&mut self, key: String, value: String, ttl_seconds: u64) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if self.cleanup_expired() == 0 {
                self.evict_soonest_expiring();
            }
        }
        self.entries.insert(key, CacheEntry::new(value, ttl_seconds));
    }

    // == Get ==
    /// Returns the value if present and unexpired. Expired entries are dropped.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = self.entries.get(key)?.is_expired();
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Delete By Prefix ==
    /// Removes every key starting with `prefix`. Returns the number removed.
    pub fn delete_by_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            self.entries.remove(key);
        }
        doomed.len()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_soonest_expiring(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}

// == Memory Backend ==
/// [`CacheBackend`] over a shared [`MemoryCacheStore`].
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: Arc<RwLock<MemoryCacheStore>>,
}

impl MemoryBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryCacheStore::new(max_entries))),
        }
    }

    /// Handle to the underlying store, for the TTL cleanup task.
    pub fn store(&self) -> Arc<RwLock<MemoryCacheStore>> {
        self.store.clone()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.store.write().await.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        self.store.write().await.set(key.to_string(), value, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().await.delete(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        Ok(self.store.write().await.delete_by_prefix(prefix) as u64)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_set_and_get() {
        let mut store = MemoryCacheStore::new(100);

        store.set("key1".to_string(), "value1".to_string(), 60);

        assert_eq!(store.get("key1").as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let mut store = MemoryCacheStore::new(100);
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn test_overwrite() {
        let mut store = MemoryCacheStore::new(100);

        store.set("key1".to_string(), "value1".to_string(), 60);
        store.set("key1".to_string(), "value2".to_string(), 60);

        assert_eq!(store.get("key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ttl_expiration() {
        let mut store = MemoryCacheStore::new(100);

        store.set("key1".to_string(), "value1".to_string(), 1);
        assert!(store.get("key1").is_some());

        sleep(Duration::from_millis(1100));

        assert!(store.get("key1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_by_prefix_leaves_other_namespaces() {
        let mut store = MemoryCacheStore::new(100);
        store.set("products:list:page=1".to_string(), "a".to_string(), 60);
        store.set("products:list:page=2".to_string(), "b".to_string(), 60);
        store.set("products:byId:1".to_string(), "c".to_string(), 60);
        store.set("products:listing".to_string(), "d".to_string(), 60);

        let removed = store.delete_by_prefix("products:list:");

        assert_eq!(removed, 2);
        assert!(store.get("products:byId:1").is_some());
        assert!(store.get("products:listing").is_some());
        assert!(store.get("products:list:page=1").is_none());
    }

    #[test]
    fn test_capacity_evicts_soonest_expiring() {
        let mut store = MemoryCacheStore::new(2);
        store.set("short".to_string(), "a".to_string(), 5);
        store.set("long".to_string(), "b".to_string(), 500);
        store.set("new".to_string(), "c".to_string(), 60);

        assert_eq!(store.len(), 2);
        assert!(store.get("short").is_none());
        assert!(store.get("long").is_some());
        assert!(store.get("new").is_some());
    }

    #[test]
    fn test_cleanup_expired() {
        let mut store = MemoryCacheStore::new(100);
        store.set("key1".to_string(), "value1".to_string(), 1);
        store.set("key2".to_string(), "value2".to_string(), 10);

        sleep(Duration::from_millis(1100));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[tokio::test]
    async fn test_backend_roundtrip() {
        let backend = MemoryBackend::new(10);
        backend.set("k", "v".to_string(), 30).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));

        backend.delete("k").await.unwrap();
        assert!(backend.get("k").await.unwrap().is_none());
        assert!(backend.ping().await.is_ok());
    }
}
