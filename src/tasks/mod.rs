//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired entries from the in-memory cache backend
//! - Liveness Probe: Pings the cache backend and restores it after an outage

mod cleanup;
mod probe;

pub use cleanup::spawn_cleanup_task;
pub use probe::spawn_probe_task;
