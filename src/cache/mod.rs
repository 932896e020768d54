//! Cache Module
//!
//! Best-effort caching for catalog reads: key construction, the backend seam,
//! in-memory and Redis backends, and the shared [`CatalogCache`] handle.

mod backend;
mod client;
mod entry;
pub mod keys;
mod memory;
mod redis_backend;


// Re-export public types
pub use backend::{CacheBackend, CacheError};
pub use client::{CacheSettings, CatalogCache};
pub use entry::CacheEntry;
pub use keys::{item_key, list_key, ITEM_PREFIX, LIST_PREFIX};
pub use memory::{MemoryBackend, MemoryCacheStore};
pub use redis_backend::RedisBackend;
