//! Catalog Cache - a product catalog with a cache-coherent query layer
//!
//! Reads are served cache-first with deterministic keys, writes invalidate
//! affected entries, and the service keeps working from the store whenever
//! the cache is unreachable.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use catalog::CatalogService;
pub use config::Config;
pub use error::CatalogError;
pub use tasks::{spawn_cleanup_task, spawn_probe_task};
