//! Cache Liveness Probe
//!
//! Once the cache is marked down, request paths stop touching it entirely.
//! This task is the only thing that brings it back.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CatalogCache;

/// Spawns a task that probes the cache every `probe_interval_secs` seconds.
/// Each probe is bounded by the cache's probe timeout and never blocks
/// request handling.
pub fn spawn_probe_task(cache: CatalogCache, probe_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(probe_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache liveness probe with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;
            let live = cache.probe().await;
            debug!(live, "Cache probe finished");
        }
    })
}
