//! Cache Client Module
//!
//! [`CatalogCache`] is the process-wide cache handle injected into the
//! catalog service. Every call is best-effort: failures, timeouts and
//! undecodable payloads all look like a miss to the caller. A liveness flag
//! short-circuits every operation while the backend is unreachable; only the
//! liveness probe flips it back.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::backend::{CacheBackend, CacheError};

/// Timeouts applied to backend calls.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Budget for a single get/set/delete
    pub op_timeout: Duration,
    /// Budget for a liveness probe, including any reconnect
    pub probe_timeout: Duration,
    /// Budget for a whole prefix deletion, which may take many round trips.
    /// Running out of it is not treated as an outage.
    pub sweep_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_millis(250),
            probe_timeout: Duration::from_millis(2000),
            sweep_timeout: Duration::from_millis(2000),
        }
    }
}

struct Shared {
    backend: Arc<dyn CacheBackend>,
    live: AtomicBool,
    settings: CacheSettings,
}

impl Shared {
    fn mark_down(&self, op: &str, key: &str, err: &CacheError) {
        if self.live.swap(false, Ordering::AcqRel) {
            warn!(
                backend = self.backend.name(),
                op,
                key,
                error = %err,
                "Cache unreachable, serving from store until it recovers"
            );
        }
    }
}

/// Shared cache handle. Cloning is cheap.
#[derive(Clone)]
pub struct CatalogCache {
    shared: Option<Arc<Shared>>,
}

impl CatalogCache {
    /// Wraps a backend, assuming it is reachable.
    pub fn new(backend: Arc<dyn CacheBackend>, settings: CacheSettings) -> Self {
        Self {
            shared: Some(Arc::new(Shared {
                backend,
                live: AtomicBool::new(true),
                settings,
            })),
        }
    }

    /// Wraps a backend and probes it once to set the initial liveness.
    pub async fn connect(backend: Arc<dyn CacheBackend>, settings: CacheSettings) -> Self {
        let cache = Self::new(backend, settings);
        cache.probe().await;
        cache
    }

    /// A cache that is permanently absent. Every operation is a no-op.
    pub fn disabled() -> Self {
        Self { shared: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.is_some()
    }

    pub fn is_available(&self) -> bool {
        self.live().is_some()
    }

    fn live(&self) -> Option<&Shared> {
        self.shared
            .as_deref()
            .filter(|shared| shared.live.load(Ordering::Acquire))
    }

    // == Get ==
    /// Returns the decoded value, or `None` on miss or any failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let shared = self.live()?;
        let raw = guarded(shared, "get", key, shared.backend.get(key)).await??;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(key, error = %err, "Discarding undecodable cache entry");
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` for `ttl_secs` (raised to at least 1). Failures are
    /// logged and dropped.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Some(shared) = self.live() else {
            return;
        };
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key, error = %err, "Failed to encode cache payload");
                return;
            }
        };
        guarded(
            shared,
            "set",
            key,
            shared.backend.set(key, payload, ttl_secs.max(1)),
        )
        .await;
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) {
        let Some(shared) = self.live() else {
            return;
        };
        guarded(shared, "delete", key, shared.backend.delete(key)).await;
    }

    // == Delete By Prefix ==
    /// Runs under the sweep budget instead of the per-operation one. If the
    /// budget runs out, whatever was not yet removed expires by TTL.
    pub async fn delete_by_prefix(&self, prefix: &str) {
        let Some(shared) = self.live() else {
            return;
        };
        let sweep = tokio::time::timeout(
            shared.settings.sweep_timeout,
            shared.backend.delete_by_prefix(prefix),
        )
        .await;

        match sweep {
            Ok(result) => {
                if let Some(removed) = settle(shared, "delete_by_prefix", prefix, result) {
                    debug!(prefix, removed, "Invalidated cache prefix");
                }
            }
            Err(_) => warn!(
                backend = shared.backend.name(),
                prefix,
                "Prefix deletion ran out of time, remaining keys expire by TTL"
            ),
        }
    }

    // == Probe ==
    /// Pings the backend within the probe timeout and updates liveness.
    /// Returns the new liveness; a disabled cache is never live.
    pub async fn probe(&self) -> bool {
        let Some(shared) = self.shared.as_deref() else {
            return false;
        };

        let result = tokio::time::timeout(shared.settings.probe_timeout, shared.backend.ping())
            .await
            .unwrap_or(Err(CacheError::Timeout));

        match result {
            Ok(()) => {
                if !shared.live.swap(true, Ordering::AcqRel) {
                    info!(backend = shared.backend.name(), "Cache reachable again");
                }
                true
            }
            Err(err) => {
                shared.mark_down("ping", "", &err);
                false
            }
        }
    }
}

/// Runs a backend call under the operation timeout. Connectivity failures
/// mark the backend down; everything else is only logged.
async fn guarded<T, F>(shared: &Shared, op: &str, key: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, CacheError>>,
{
    let result = tokio::time::timeout(shared.settings.op_timeout, fut)
        .await
        .unwrap_or(Err(CacheError::Timeout));
    settle(shared, op, key, result)
}

fn settle<T>(shared: &Shared, op: &str, key: &str, result: Result<T, CacheError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if err.is_connectivity() => {
            shared.mark_down(op, key, &err);
            None
        }
        Err(err) => {
            warn!(backend = shared.backend.name(), op, key, error = %err, "Cache operation failed");
            None
        }
    }
}
