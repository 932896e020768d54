//! Cache Entry Module
//!
//! A serialized payload with a mandatory expiry.

use chrono::Utc;

// == Cache Entry ==
/// A single cached payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized payload
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry expiring `ttl_seconds` from now. A TTL of 0 is raised
    /// to 1 second; entries without expiry are not supported.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            expires_at: now.saturating_add(ttl_seconds.max(1).saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
