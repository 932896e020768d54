//! Configuration Module
//!
//! Loads server configuration from environment variables, after reading an
//! optional `.env` file. Unparseable values fall back to their defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheSettings;
use crate::catalog::CacheTtl;

/// Server configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Postgres connection string; in-memory store when absent
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Redis connection string; in-memory cache backend when absent
    pub redis_url: Option<String>,
    /// Run without any cache
    pub cache_disabled: bool,
    /// Item entry TTL in seconds
    pub cache_item_ttl: u64,
    /// List entry TTL in seconds
    pub cache_list_ttl: u64,
    pub cache_op_timeout_ms: u64,
    pub cache_connect_timeout_ms: u64,
    /// Budget for one list invalidation sweep
    pub cache_sweep_timeout_ms: u64,
    /// Liveness probe interval in seconds
    pub cache_probe_interval: u64,
    /// Capacity of the in-memory cache backend
    pub cache_max_entries: usize,
    /// TTL sweep interval in seconds for the in-memory cache backend
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config from the process environment.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` or `PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_URL` - Postgres URL (default: unset, in-memory store)
    /// - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
    /// - `REDIS_URL` - Redis URL (default: unset, in-memory cache)
    /// - `CACHE_DISABLED` - `true`/`1` to run without a cache (default: false)
    /// - `CACHE_ITEM_TTL` / `CACHE_LIST_TTL` - Seconds (default: 60 / 30)
    /// - `CACHE_OP_TIMEOUT_MS` - Per-operation budget (default: 250)
    /// - `CACHE_CONNECT_TIMEOUT_MS` - Connect and probe budget (default: 2000)
    /// - `CACHE_SWEEP_TIMEOUT_MS` - List invalidation budget (default: 2000)
    /// - `CACHE_PROBE_INTERVAL` - Seconds between probes (default: 5)
    /// - `CACHE_MAX_ENTRIES` - In-memory cache capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let port = |name: &str| -> Option<u16> { lookup(name)?.trim().parse().ok() };
        let url = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            server_port: port("SERVER_PORT")
                .or_else(|| port("PORT"))
                .unwrap_or(defaults.server_port),
            database_url: url("DATABASE_URL"),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)
                .max(1),
            redis_url: url("REDIS_URL"),
            cache_disabled: lookup("CACHE_DISABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.cache_disabled),
            cache_item_ttl: parse_or(&lookup, "CACHE_ITEM_TTL", defaults.cache_item_ttl).max(1),
            cache_list_ttl: parse_or(&lookup, "CACHE_LIST_TTL", defaults.cache_list_ttl).max(1),
            cache_op_timeout_ms: parse_or(
                &lookup,
                "CACHE_OP_TIMEOUT_MS",
                defaults.cache_op_timeout_ms,
            ),
            cache_connect_timeout_ms: parse_or(
                &lookup,
                "CACHE_CONNECT_TIMEOUT_MS",
                defaults.cache_connect_timeout_ms,
            ),
            cache_sweep_timeout_ms: parse_or(
                &lookup,
                "CACHE_SWEEP_TIMEOUT_MS",
                defaults.cache_sweep_timeout_ms,
            ),
            cache_probe_interval: parse_or(
                &lookup,
                "CACHE_PROBE_INTERVAL",
                defaults.cache_probe_interval,
            )
            .max(1),
            cache_max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", defaults.cache_max_entries)
                .max(1),
            cleanup_interval: parse_or(&lookup, "CLEANUP_INTERVAL", defaults.cleanup_interval)
                .max(1),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            op_timeout: Duration::from_millis(self.cache_op_timeout_ms),
            probe_timeout: Duration::from_millis(self.cache_connect_timeout_ms),
            sweep_timeout: Duration::from_millis(self.cache_sweep_timeout_ms),
        }
    }

    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            item_secs: self.cache_item_ttl,
            list_secs: self.cache_list_ttl,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_url: None,
            db_max_connections: 5,
            redis_url: None,
            cache_disabled: false,
            cache_item_ttl: 60,
            cache_list_ttl: 30,
            cache_op_timeout_ms: 250,
            cache_connect_timeout_ms: 2000,
            cache_sweep_timeout_ms: 2000,
            cache_probe_interval: 5,
            cache_max_entries: 10_000,
            cleanup_interval: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_item_ttl, 60);
        assert_eq!(config.cache_list_ttl, 30);
        assert_eq!(config.cache_op_timeout_ms, 250);
        assert!(config.database_url.is_none());
        assert!(!config.cache_disabled);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(from_pairs(&[]), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("REDIS_URL", " redis://127.0.0.1:6379 "),
            ("CACHE_DISABLED", "TRUE"),
            ("CACHE_ITEM_TTL", "120"),
        ]);
        assert_eq!(config.server_port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/catalog")
        );
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert!(config.cache_disabled);
        assert_eq!(config.cache_ttl().item_secs, 120);
    }

    #[test]
    fn test_server_port_wins_over_port() {
        let config = from_pairs(&[("SERVER_PORT", "4000"), ("PORT", "5000")]);
        assert_eq!(config.server_port, 4000);
    }

    #[test]
    fn test_garbage_falls_back_and_ttls_floor_at_one() {
        let config = from_pairs(&[
            ("CACHE_LIST_TTL", "0"),
            ("CACHE_ITEM_TTL", "soon"),
            ("CACHE_OP_TIMEOUT_MS", "-5"),
            ("DATABASE_URL", "   "),
        ]);
        assert_eq!(config.cache_list_ttl, 1);
        assert_eq!(config.cache_item_ttl, 60);
        assert_eq!(config.cache_op_timeout_ms, 250);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_cache_settings() {
        let settings = from_pairs(&[
            ("CACHE_CONNECT_TIMEOUT_MS", "500"),
            ("CACHE_SWEEP_TIMEOUT_MS", "5000"),
        ])
        .cache_settings();
        assert_eq!(settings.op_timeout, Duration::from_millis(250));
        assert_eq!(settings.probe_timeout, Duration::from_millis(500));
        assert_eq!(settings.sweep_timeout, Duration::from_millis(5000));
    }
}
