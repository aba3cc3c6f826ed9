//! Cache Entry Module
//!
//! Defines a single stored snapshot together with its expiry and size metadata.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A value snapshot held by the cache store.
///
/// Entries are never handed out; readers receive clones of `value`.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored snapshot
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Absolute expiry timestamp (Unix milliseconds)
    pub expiry_time: u64,
    /// Insertion counter, breaks `created_at` ties in eviction order
    pub sequence: u64,
    /// Approximate memory footprint in bytes
    pub size_bytes: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after now.
    pub fn new(value: V, ttl: Duration, sequence: u64, size_bytes: usize) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            value,
            created_at: now,
            expiry_time: now.saturating_add(ttl_ms),
            sequence,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// The expiry instant itself counts as expired, so a zero TTL produces an
    /// entry that is already stale when it is read back.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expiry_time
    }

    /// Checks whether `now` is strictly past the expiry instant.
    ///
    /// The sweep uses this so an entry is never removed at its exact expiry
    /// millisecond, only after it.
    pub fn is_past_expiry_at(&self, now: u64) -> bool {
        self.expiry_time < now
    }

    /// Checks whether the entry has expired against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    // == Eviction Rank ==
    /// Ordering key for FIFO eviction: oldest creation first, then insertion order.
    pub fn eviction_rank(&self) -> (u64, u64) {
        (self.created_at, self.sequence)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
