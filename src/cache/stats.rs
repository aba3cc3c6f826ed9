//! Cache Statistics Module
//!
//! Operation counters and the point-in-time statistics snapshot.

use serde::Serialize;

// == Cache Counters ==
/// Running operation counters. Survive `clear()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Reads that returned a live value
    pub hits: u64,
    /// Reads of absent or expired keys
    pub misses: u64,
    /// Completed writes
    pub sets: u64,
    /// Explicit removals of present keys
    pub deletes: u64,
    /// Entries removed to satisfy a size or memory bound
    pub evictions: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates counters with every value at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}

// == Cache Stats ==
/// Snapshot returned by `CacheStore::stats`, computed by scanning every entry.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Entries currently held, expired or not
    pub total_items: usize,
    /// Entries that have not expired yet
    pub active_items: usize,
    /// Entries past their expiry awaiting lazy deletion or a sweep
    pub expired_items: usize,
    /// Sum of entry size estimates, in KiB
    pub estimated_memory_kb: f64,
    /// Same as `total_items`
    pub cache_size: usize,
    /// Configured entry bound
    pub max_size: usize,
    /// Configured memory bound, in MiB
    pub max_memory_mb: f64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub counters: CacheCounters,
}
