//! Cache Module
//!
//! Bounded in-memory key/value store with TTL expiry and FIFO eviction.

mod codec;
mod entry;
pub mod keys;
mod stats;
mod store;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

// Re-export public types
pub use codec::{CodecError, JsonCodec, ValueCodec};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::{CacheCounters, CacheStats};
pub use store::CacheStore;

/// Cache store shared between request handlers and the sweep task.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;

// == Public Constants ==
/// Percentage of entries evicted when the entry bound is reached
pub const SIZE_EVICTION_PERCENT: usize = 10;

/// Percentage of entries evicted when the memory bound is exceeded
pub const MEMORY_EVICTION_PERCENT: usize = 20;

// == Cache Limits ==
/// Bounds and timing for a cache store.
#[derive(Debug, Clone, Copy)]
pub struct CacheLimits {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Maximum estimated memory in bytes
    pub max_memory_bytes: usize,
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Period of the background sweep
    pub sweep_interval: Duration,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_memory_bytes: 50 * 1024 * 1024,
            default_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(30),
        }
    }
}
