//! Cache Store Module
//!
//! Main cache engine: HashMap storage with TTL expiry, FIFO eviction under
//! entry and memory bounds, and operation counters.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{
    current_timestamp_ms, CacheCounters, CacheEntry, CacheLimits, CacheStats, JsonCodec,
    ValueCodec, MEMORY_EVICTION_PERCENT, SIZE_EVICTION_PERCENT,
};

// == Cache Store ==
/// Bounded key/value store holding snapshots of `V`.
///
/// No operation fails: serialization problems degrade to storing the value
/// as given, and every bound is enforced by evicting the oldest entries.
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Snapshot serializer
    codec: Box<dyn ValueCodec<V>>,
    /// Operation counters
    counters: CacheCounters,
    /// Bounds and default TTL
    limits: CacheLimits,
    /// Running sum of entry size estimates
    memory_bytes: usize,
    /// Last insertion sequence handed out
    sequence: u64,
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("memory_bytes", &self.memory_bytes)
            .field("counters", &self.counters)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl<V> CacheStore<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    // == Constructor ==
    /// Creates a store that snapshots values through JSON.
    pub fn new(limits: CacheLimits) -> Self {
        Self::with_codec(limits, JsonCodec)
    }
}

impl<V: Clone> CacheStore<V> {
    /// Creates a store with a custom snapshot codec.
    ///
    /// An entry bound of zero is raised to one.
    pub fn with_codec(mut limits: CacheLimits, codec: impl ValueCodec<V> + 'static) -> Self {
        limits.max_entries = limits.max_entries.max(1);
        Self {
            entries: HashMap::new(),
            codec: Box::new(codec),
            counters: CacheCounters::new(),
            limits,
            memory_bytes: 0,
            sequence: 0,
        }
    }

    // == Set ==
    /// Stores a snapshot of `value` under `key`, replacing any previous entry.
    ///
    /// A new key arriving at the entry bound first evicts the oldest 10%.
    /// If the memory estimate exceeds its bound after the insert, the oldest
    /// 20% are evicted.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to snapshot
    /// * `ttl` - Time to live (uses the default TTL if None)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let (snapshot, size_bytes) = self.snapshot(&key, value);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.limits.max_entries {
            let evicted = self.evict_oldest(SIZE_EVICTION_PERCENT);
            debug!(evicted, max_entries = self.limits.max_entries, "entry bound reached");
        }

        self.sequence += 1;
        let ttl = ttl.unwrap_or(self.limits.default_ttl);
        let entry = CacheEntry::new(snapshot, ttl, self.sequence, size_bytes);
        if let Some(previous) = self.entries.insert(key, entry) {
            self.memory_bytes -= previous.size_bytes;
        }
        self.memory_bytes += size_bytes;

        if self.memory_bytes > self.limits.max_memory_bytes {
            let evicted = self.evict_oldest(MEMORY_EVICTION_PERCENT);
            debug!(
                evicted,
                memory_bytes = self.memory_bytes,
                max_memory_bytes = self.limits.max_memory_bytes,
                "memory bound exceeded"
            );
        }

        self.counters.record_set();
    }

    // == Get ==
    /// Returns a clone of the live value stored under `key`.
    ///
    /// Absent and expired keys count as misses; expired entries are removed.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.check_live(key) {
            self.counters.record_miss();
            return None;
        }

        self.counters.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Has ==
    /// Returns whether `key` holds a live value. Does not touch counters.
    pub fn has(&mut self, key: &str) -> bool {
        self.check_live(key)
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.remove_entry(key).is_some() {
            self.counters.record_delete();
            true
        } else {
            false
        }
    }

    // == Delete Prefix ==
    /// Removes every key beginning with `prefix`. Returns how many were removed.
    pub fn delete_prefix(&mut self, prefix: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &matching {
            self.delete(key);
        }
        matching.len()
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.memory_bytes = 0;
    }

    // == Cleanup ==
    /// Removes every entry whose expiry instant lies strictly in the past.
    /// Returns the number removed.
    ///
    /// An entry exactly at its expiry millisecond is left for the next sweep,
    /// though `get` and `has` already treat it as a miss.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(current_timestamp_ms())
    }

    fn cleanup_at(&mut self, now: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_past_expiry_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        expired.len()
    }

    // == Stats ==
    /// Scans all entries and reports occupancy, memory and counters.
    pub fn stats(&self) -> CacheStats {
        let now = current_timestamp_ms();
        let mut expired_items = 0;
        let mut memory_bytes = 0usize;

        for entry in self.entries.values() {
            if entry.is_expired_at(now) {
                expired_items += 1;
            }
            memory_bytes += entry.size_bytes;
        }

        let total_items = self.entries.len();
        CacheStats {
            total_items,
            active_items: total_items - expired_items,
            expired_items,
            estimated_memory_kb: memory_bytes as f64 / 1024.0,
            cache_size: total_items,
            max_size: self.limits.max_entries,
            max_memory_mb: self.limits.max_memory_bytes as f64 / (1024.0 * 1024.0),
            hit_rate: self.counters.hit_rate(),
            counters: self.counters,
        }
    }

    // == Accessors ==
    /// Returns the current number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limits(&self) -> &CacheLimits {
        &self.limits
    }

    pub fn counters(&self) -> CacheCounters {
        self.counters
    }

    /// Returns the running memory estimate in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.memory_bytes
    }

    // == Internals ==
    fn snapshot(&self, key: &str, value: V) -> (V, usize) {
        match self.codec.encode(&value) {
            Ok(raw) => {
                let size_bytes = raw.len() * 2;
                match self.codec.decode(&raw) {
                    Ok(copy) => (copy, size_bytes),
                    Err(err) => {
                        warn!(key, error = %err, "snapshot decode failed, storing value as given");
                        (value, size_bytes)
                    }
                }
            }
            Err(err) => {
                warn!(key, error = %err, "value not serializable, storing value as given");
                (value, mem::size_of::<V>())
            }
        }
    }

    /// Returns whether `key` is present and unexpired, removing it if expired.
    fn check_live(&mut self, key: &str) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(current_timestamp_ms()),
            None => return false,
        };

        if expired {
            self.remove_entry(key);
            return false;
        }
        true
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.remove(key)?;
        self.memory_bytes -= removed.size_bytes;
        Some(removed)
    }

    /// Evicts the oldest `percent` of entries (rounded up) by creation order.
    fn evict_oldest(&mut self, percent: usize) -> usize {
        let len = self.entries.len();
        if len == 0 {
            return 0;
        }

        let count = (len * percent).div_ceil(100).clamp(1, len);
        let mut ranked: Vec<((u64, u64), String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.eviction_rank(), key.clone()))
            .collect();
        ranked.sort_unstable();

        for (_, key) in ranked.into_iter().take(count) {
            self.remove_entry(&key);
        }
        self.counters.record_evictions(count);
        count
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CodecError;
    use serde_json::{json, Value};
    use std::thread::sleep;

    fn limits(max_entries: usize) -> CacheLimits {
        CacheLimits {
            max_entries,
            ..CacheLimits::default()
        }
    }

    /// Codec that refuses every value.
    struct RejectingCodec;

    impl<V> ValueCodec<V> for RejectingCodec {
        fn encode(&self, _value: &V) -> Result<String, CodecError> {
            Err(CodecError::Encode("circular structure".to_string()))
        }

        fn decode(&self, raw: &str) -> Result<V, CodecError> {
            Err(CodecError::Decode(raw.to_string()))
        }
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore<Value> = CacheStore::new(limits(100));
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_entry_bound_is_raised() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(0));
        assert_eq!(store.limits().max_entries, 1);

        store.set("a", 1, None);
        store.set("b", 2, None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b"), Some(2));
    }

    #[test]
    fn test_store_set_and_get_clones_value() {
        let mut store: CacheStore<Value> = CacheStore::new(limits(100));
        let value = json!({"a": 1, "b": [1, 2, 3]});

        store.set("key1", value.clone(), None);
        let first = store.get("key1").unwrap();
        let mut second = store.get("key1").unwrap();

        assert_eq!(first, value);
        second["a"] = json!(99);
        assert_eq!(store.get("key1").unwrap(), value);
    }

    #[test]
    fn test_store_get_nonexistent_counts_miss() {
        let mut store: CacheStore<Value> = CacheStore::new(limits(100));

        assert!(store.get("nonexistent").is_none());
        assert_eq!(store.counters().misses, 1);
        assert_eq!(store.counters().hits, 0);
    }

    #[test]
    fn test_zero_ttl_reads_as_miss() {
        let mut store: CacheStore<String> = CacheStore::new(limits(500));

        store.set("seed", "v".to_string(), Some(Duration::ZERO));

        assert!(store.get("seed").is_none());
        assert_eq!(store.counters().misses, 1);
        assert!(store.is_empty(), "expired entry should be lazily deleted");
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store: CacheStore<String> = CacheStore::new(limits(100));

        store.set("key1", "value1".to_string(), Some(Duration::from_millis(30)));
        assert_eq!(store.get("key1").as_deref(), Some("value1"));

        sleep(Duration::from_millis(50));

        assert!(store.get("key1").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_has_does_not_touch_counters() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(100));
        store.set("k", 7, None);
        store.set("gone", 8, Some(Duration::ZERO));

        assert!(store.has("k"));
        assert!(!store.has("missing"));
        assert!(!store.has("gone"));

        let counters = store.counters();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(store.len(), 1, "has() lazily deletes expired entries");
    }

    #[test]
    fn test_store_delete() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(100));

        store.set("key1", 1, None);
        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));

        assert!(store.is_empty());
        assert_eq!(store.counters().deletes, 1);
        assert_eq!(store.memory_bytes(), 0);
    }

    #[test]
    fn test_delete_prefix_respects_segment_boundary() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(100));
        store.set("posts:list:1:10", 1, None);
        store.set("posts:list:1:20", 2, None);
        store.set("posts:list:10:10", 3, None);

        assert_eq!(store.delete_prefix("posts:list:1:"), 2);
        assert!(store.has("posts:list:10:10"));
        assert_eq!(store.counters().deletes, 2);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store: CacheStore<String> = CacheStore::new(limits(100));

        store.set("key1", "value1".to_string(), None);
        store.set("key1", "value2".to_string(), None);

        assert_eq!(store.get("key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.counters().sets, 2);
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(3));
        store.set("a", 1, None);
        store.set("b", 2, None);
        store.set("c", 3, None);

        store.set("b", 20, None);

        assert_eq!(store.len(), 3);
        assert_eq!(store.counters().evictions, 0);
    }

    #[test]
    fn test_size_eviction_removes_oldest_tenth() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(20));
        for i in 0..20 {
            store.set(format!("key{i}"), i, None);
        }

        store.set("overflow", 99, None);

        assert_eq!(store.len(), 19);
        assert_eq!(store.counters().evictions, 2);
        assert!(!store.has("key0"));
        assert!(!store.has("key1"));
        assert!(store.has("key2"));
        assert!(store.has("overflow"));
    }

    #[test]
    fn test_small_store_evicts_at_least_one() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(3));
        store.set("key1", 1, None);
        store.set("key2", 2, None);
        store.set("key3", 3, None);

        store.set("key4", 4, None);

        assert_eq!(store.len(), 3);
        assert!(!store.has("key1"));
        assert!(store.has("key2"));
        assert!(store.has("key4"));
    }

    #[test]
    fn test_eviction_ignores_reads() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(3));
        store.set("key1", 1, None);
        store.set("key2", 2, None);
        store.set("key3", 3, None);

        // FIFO, not LRU: reading key1 does not protect it
        store.get("key1");
        store.set("key4", 4, None);

        assert!(!store.has("key1"));
        assert!(store.has("key2"));
    }

    #[test]
    fn test_memory_eviction_removes_oldest_fifth() {
        // Each "xxxxxxxx" encodes to 10 bytes, estimated at 20
        let mut store: CacheStore<String> = CacheStore::new(CacheLimits {
            max_entries: 100,
            max_memory_bytes: 200,
            ..CacheLimits::default()
        });
        for i in 0..10 {
            store.set(format!("key{i}"), "x".repeat(8), None);
        }
        assert_eq!(store.memory_bytes(), 200);
        assert_eq!(store.counters().evictions, 0);

        store.set("key10", "x".repeat(8), None);

        // 11 entries over budget, ceil(11 * 0.2) = 3 evicted
        assert_eq!(store.len(), 8);
        assert_eq!(store.counters().evictions, 3);
        assert!(!store.has("key0"));
        assert!(!store.has("key2"));
        assert!(store.has("key3"));
        assert!(store.has("key10"));
        assert_eq!(store.memory_bytes(), 160);
    }

    #[test]
    fn test_unserializable_value_is_stored_as_given() {
        let mut store = CacheStore::with_codec(limits(10), RejectingCodec);

        store.set("raw", vec![1u8, 2, 3], None);

        assert_eq!(store.get("raw"), Some(vec![1, 2, 3]));
        assert_eq!(store.counters().sets, 1);
        assert_eq!(store.memory_bytes(), mem::size_of::<Vec<u8>>());
    }

    #[test]
    fn test_store_cleanup() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(100));

        store.set("short", 1, Some(Duration::from_millis(20)));
        store.set("long", 2, Some(Duration::from_secs(10)));

        sleep(Duration::from_millis(40));

        assert_eq!(store.cleanup(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.has("long"));
    }

    #[test]
    fn test_cleanup_keeps_entry_at_expiry_instant() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(100));
        store.set("edge", 1, Some(Duration::from_secs(60)));
        let expiry = store.entries["edge"].expiry_time;

        assert_eq!(store.cleanup_at(expiry - 1), 0);
        assert_eq!(store.cleanup_at(expiry), 0);
        assert_eq!(store.len(), 1);

        assert_eq!(store.cleanup_at(expiry + 1), 1);
        assert!(store.is_empty());
        assert_eq!(store.memory_bytes(), 0);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut store: CacheStore<u32> = CacheStore::new(limits(100));
        store.set("a", 1, None);
        store.get("a");

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.memory_bytes(), 0);
        assert_eq!(store.counters().hits, 1);
        assert_eq!(store.counters().sets, 1);
    }

    #[test]
    fn test_store_stats() {
        let mut store: CacheStore<String> = CacheStore::new(CacheLimits {
            max_entries: 50,
            max_memory_bytes: 2 * 1024 * 1024,
            ..CacheLimits::default()
        });

        store.set("live", "value".to_string(), None);
        store.set("stale", "value".to_string(), Some(Duration::ZERO));
        store.get("live");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.active_items, 1);
        assert_eq!(stats.expired_items, 1);
        assert_eq!(stats.cache_size, 2);
        assert_eq!(stats.max_size, 50);
        assert_eq!(stats.max_memory_mb, 2.0);
        assert_eq!(stats.hit_rate, 0.5);
        // "\"value\"" is 7 bytes, estimated at 14 per entry
        assert_eq!(stats.estimated_memory_kb, 28.0 / 1024.0);
        assert_eq!(stats.counters.sets, 2);
    }
}
