//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheLimits;
use crate::posts::ReadThroughOptions;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of cache entries
    pub max_entries: usize,
    /// Maximum estimated cache memory in MiB
    pub max_memory_mb: usize,
    /// Default TTL in milliseconds for single-post keys
    pub default_ttl_ms: u64,
    /// TTL in milliseconds for listing and trending keys
    pub list_ttl_ms: u64,
    /// Expiry sweep interval in milliseconds
    pub sweep_interval_ms: u64,
    /// Share of `max_entries` above which miss write-back is skipped
    pub write_back_guard: f64,
    /// Number of newest posts pre-cached at startup
    pub prewarm_count: u32,
    /// HTTP server port
    pub server_port: u16,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_MAX_MEMORY_MB` - Memory bound in MiB (default: 50)
    /// - `CACHE_DEFAULT_TTL_MS` - Single-post TTL (default: 300000)
    /// - `CACHE_LIST_TTL_MS` - Listing TTL (default: 120000)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep frequency (default: 30000)
    /// - `CACHE_WRITE_BACK_GUARD` - Write-back guard ratio (default: 0.8)
    /// - `CACHE_PREWARM_COUNT` - Posts pre-cached at startup (default: 10)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries).max(1),
            max_memory_mb: env_or("CACHE_MAX_MEMORY_MB", defaults.max_memory_mb),
            default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.default_ttl_ms),
            list_ttl_ms: env_or("CACHE_LIST_TTL_MS", defaults.list_ttl_ms),
            sweep_interval_ms: env_or("CACHE_SWEEP_INTERVAL_MS", defaults.sweep_interval_ms)
                .max(1),
            write_back_guard: env_or("CACHE_WRITE_BACK_GUARD", defaults.write_back_guard)
                .clamp(0.0, 1.0),
            prewarm_count: env_or("CACHE_PREWARM_COUNT", defaults.prewarm_count),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Bounds for the cache store.
    pub fn cache_limits(&self) -> CacheLimits {
        CacheLimits {
            max_entries: self.max_entries,
            max_memory_bytes: self.max_memory_mb.saturating_mul(1024 * 1024),
            default_ttl: Duration::from_millis(self.default_ttl_ms),
            sweep_interval: Duration::from_millis(self.sweep_interval_ms),
        }
    }

    /// TTLs and write-back guard for the post read path.
    pub fn read_through_options(&self) -> ReadThroughOptions {
        ReadThroughOptions {
            entity_ttl: Duration::from_millis(self.default_ttl_ms),
            list_ttl: Duration::from_millis(self.list_ttl_ms),
            write_back_guard: self.write_back_guard,
            ..ReadThroughOptions::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_memory_mb: 50,
            default_ttl_ms: 5 * 60 * 1000,
            list_ttl_ms: 2 * 60 * 1000,
            sweep_interval_ms: 30 * 1000,
            write_back_guard: 0.8,
            prewarm_count: 10,
            server_port: 3000,
        }
    }
}
