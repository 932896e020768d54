//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the
//! in-memory cache backend. Redis expires keys on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryCacheStore;

/// Spawns a background task that sweeps expired cache entries every
/// `cleanup_interval_secs` seconds.
///
/// Returns the task handle so it can be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let backend = MemoryBackend::new(10_000);
/// let cleanup_handle = spawn_cleanup_task(backend.store(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    store: Arc<RwLock<MemoryCacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_store() -> Arc<RwLock<MemoryCacheStore>> {
        Arc::new(RwLock::new(MemoryCacheStore::new(100)))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let store = shared_store();
        store
            .write()
            .await
            .set("expire_soon".to_string(), "value".to_string(), 1);

        let handle = spawn_cleanup_task(store.clone(), 1);

        // Wait for entry to expire and cleanup to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(store.read().await.len(), 0, "Expired entry should be swept");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let store = shared_store();
        store
            .write()
            .await
            .set("long_lived".to_string(), "value".to_string(), 3600);

        let handle = spawn_cleanup_task(store.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let value = store.write().await.get("long_lived");
        assert_eq!(value.as_deref(), Some("value"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(shared_store(), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
