//! Bounded caching of tool invocation results.
//!
//! Tool calls in an agent loop are frequently repeated with identical
//! parameters (re-reading a file, re-listing a directory). Each cache
//! instance serves one tool namespace and bounds its footprint three ways:
//! a per-entry size cap, TTL expiration (lazy on read plus a periodic
//! sweep), and LRU eviction once total size passes the configured limit.
//! Entries carry dependency identifiers so a filesystem change elsewhere
//! can bulk-invalidate everything derived from the changed path.

pub mod key;

pub use key::{canonical_json, generate_key};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, trace};

/// Default total size limit of 50 MiB.
pub const DEFAULT_MAX_SIZE_BYTES: usize = 50 * 1024 * 1024;
/// Default time-to-live of five minutes.
pub const DEFAULT_TTL_MS: i64 = 300_000;
/// Default per-entry size cap of 5 MiB.
pub const DEFAULT_MAX_RESULT_SIZE_BYTES: usize = 5 * 1024 * 1024;
/// Default periodic sweep cadence of one minute.
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60_000;

/// Limits and identity for one cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Total bytes held across all entries before LRU eviction kicks in.
    pub max_size_bytes: usize,
    /// TTL stamped on entries stored via [`ToolResultCache::set`].
    pub default_ttl_ms: i64,
    /// Per-entry cap. The effective cap is the smaller of this and
    /// `max_size_bytes`: an entry larger than the whole cache is never
    /// accepted.
    pub max_result_size_bytes: usize,
    /// Cadence of the periodic expiration sweep.
    pub cleanup_interval_ms: u64,
    /// Tool namespace this cache serves, used in log output.
    pub namespace: String,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            default_ttl_ms: DEFAULT_TTL_MS,
            max_result_size_bytes: DEFAULT_MAX_RESULT_SIZE_BYTES,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            namespace: "default".to_string(),
        }
    }

    pub fn with_max_size(mut self, max_size_bytes: usize) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_default_ttl(mut self, default_ttl_ms: i64) -> Self {
        self.default_ttl_ms = default_ttl_ms;
        self
    }

    pub fn with_max_result_size(mut self, max_result_size_bytes: usize) -> Self {
        self.max_result_size_bytes = max_result_size_bytes;
        self
    }

    pub fn with_cleanup_interval(mut self, cleanup_interval_ms: u64) -> Self {
        self.cleanup_interval_ms = cleanup_interval_ms;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One cached tool invocation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CachedToolResult {
    pub key: u64,
    /// Echo of the parameters the tool was invoked with.
    pub parameters: Value,
    /// The tool's output payload.
    pub result: Value,
    pub timestamp_ms: i64,
    pub ttl_ms: i64,
    pub access_count: u64,
    pub last_accessed_ms: i64,
    /// Serialized size of `result`, counted against the cache budget.
    pub size_bytes: usize,
    pub valid: bool,
    /// External resources this result was derived from, e.g. file paths.
    pub dependencies: Vec<String>,
}

impl CachedToolResult {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.timestamp_ms >= self.ttl_ms
    }
}

/// Counter snapshot for observability.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct CacheStats {
    pub item_count: usize,
    pub total_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// `hits / (hits + misses)`, 0.0 before any request.
    pub hit_ratio: f64,
}

impl CacheStats {
    /// Compact one-line form for log output.
    pub fn to_log_string(&self) -> String {
        format!(
            "cache: {} items, {} bytes, {} hits, {} misses, {} evictions, {} expirations ({:.0}% hit ratio)",
            self.item_count,
            self.total_size_bytes,
            self.hits,
            self.misses,
            self.evictions,
            self.expirations,
            self.hit_ratio * 100.0
        )
    }
}

#[derive(Debug)]
struct StoredEntry {
    record: CachedToolResult,
    /// Monotonic access stamp. Wall-clock milliseconds tie under load, so
    /// LRU ordering uses this counter instead.
    lru_seq: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<u64, StoredEntry>,
    total_size_bytes: usize,
    access_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// Size/TTL/LRU-bounded cache of tool results with dependency invalidation.
///
/// All operations take `&self`; the instance is safe to share behind an
/// [`Arc`] between the caller and the periodic sweep task. Counters for
/// hits, misses, evictions, and expirations accumulate for the lifetime of
/// the instance and survive [`clear`](Self::clear).
#[derive(Debug)]
pub struct ToolResultCache {
    inner: Mutex<CacheInner>,
    config: CacheConfig,
}

impl ToolResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Stable key for a parameter value. See [`key::generate_key`].
    pub fn generate_key(&self, parameters: &Value) -> u64 {
        key::generate_key(parameters)
    }

    /// Store a result under `key` with the configured default TTL.
    pub fn set(
        &self,
        key: u64,
        parameters: Value,
        result: Value,
        dependencies: Vec<String>,
    ) -> bool {
        self.set_with_ttl(key, parameters, result, dependencies, self.config.default_ttl_ms)
    }

    /// Store a result under `key` with an explicit TTL.
    ///
    /// Returns false without storing when the TTL is not positive or the
    /// serialized result exceeds the effective per-entry cap, the smaller
    /// of `max_result_size_bytes` and `max_size_bytes`. Replacing an
    /// existing key releases the old entry's size before the new one is
    /// counted.
    pub fn set_with_ttl(
        &self,
        key: u64,
        parameters: Value,
        result: Value,
        dependencies: Vec<String>,
        ttl_ms: i64,
    ) -> bool {
        if ttl_ms <= 0 {
            debug!(
                "cache {}: rejected entry {} with nonpositive ttl {}",
                self.config.namespace, key, ttl_ms
            );
            return false;
        }
        let size_bytes = result.to_string().len();
        let max_entry_bytes = self.config.max_result_size_bytes.min(self.config.max_size_bytes);
        if size_bytes > max_entry_bytes {
            debug!(
                "cache {}: rejected oversized entry {} ({} bytes over the {} byte cap)",
                self.config.namespace, key, size_bytes, max_entry_bytes
            );
            return false;
        }

        let now = crate::epoch_ms();
        let mut inner = self.inner.lock().unwrap();

        if let Some(old) = inner.entries.remove(&key) {
            inner.total_size_bytes = inner.total_size_bytes.saturating_sub(old.record.size_bytes);
        }

        inner.access_seq += 1;
        let lru_seq = inner.access_seq;
        let record = CachedToolResult {
            key,
            parameters,
            result,
            timestamp_ms: now,
            ttl_ms,
            access_count: 0,
            last_accessed_ms: now,
            size_bytes,
            valid: true,
            dependencies,
        };
        inner.total_size_bytes += size_bytes;
        inner.entries.insert(key, StoredEntry { record, lru_seq });

        // The just-stored entry fits the total budget on its own, so
        // evicting older entries is always enough to get back under it.
        while inner.total_size_bytes > self.config.max_size_bytes && inner.entries.len() > 1 {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.lru_seq)
                .map(|(k, _)| *k);
            let Some(oldest) = oldest else { break };
            if let Some(evicted) = inner.entries.remove(&oldest) {
                inner.total_size_bytes =
                    inner.total_size_bytes.saturating_sub(evicted.record.size_bytes);
                inner.evictions += 1;
                trace!(
                    "cache {}: evicted least recently used entry {} ({} bytes)",
                    self.config.namespace, oldest, evicted.record.size_bytes
                );
            }
        }
        true
    }

    /// Fetch the entry under `key` if it is present, unexpired, and valid.
    ///
    /// A hit bumps `access_count`, refreshes `last_accessed_ms`, and marks
    /// the entry most recently used. An expired entry found here is removed
    /// immediately, without waiting for the periodic sweep.
    pub fn get(&self, key: u64) -> Option<CachedToolResult> {
        let now = crate::epoch_ms();
        let mut inner = self.inner.lock().unwrap();

        let expired = inner
            .entries
            .get(&key)
            .is_some_and(|entry| entry.record.is_expired(now));
        if expired {
            if let Some(entry) = inner.entries.remove(&key) {
                inner.total_size_bytes =
                    inner.total_size_bytes.saturating_sub(entry.record.size_bytes);
                inner.expirations += 1;
            }
        }

        let usable = !expired && inner.entries.get(&key).is_some_and(|entry| entry.record.valid);
        if !usable {
            inner.misses += 1;
            trace!("cache {}: miss for key {}", self.config.namespace, key);
            return None;
        }

        inner.access_seq += 1;
        let lru_seq = inner.access_seq;
        let Some(entry) = inner.entries.get_mut(&key) else {
            inner.misses += 1;
            return None;
        };
        entry.record.access_count += 1;
        entry.record.last_accessed_ms = now;
        entry.lru_seq = lru_seq;
        let record = entry.record.clone();
        inner.hits += 1;
        Some(record)
    }

    /// Remove one entry. Returns whether it was present.
    pub fn invalidate(&self, key: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.remove(&key) {
            Some(entry) => {
                inner.total_size_bytes =
                    inner.total_size_bytes.saturating_sub(entry.record.size_bytes);
                true
            }
            None => false,
        }
    }

    /// Remove every entry whose dependency list contains `dependency`.
    /// Returns how many were removed.
    pub fn invalidate_by_dependency(&self, dependency: &str) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let stale: Vec<u64> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.record.dependencies.iter().any(|d| d == dependency))
            .map(|(k, _)| *k)
            .collect();
        for key in &stale {
            if let Some(entry) = inner.entries.remove(key) {
                inner.total_size_bytes =
                    inner.total_size_bytes.saturating_sub(entry.record.size_bytes);
            }
        }
        if !stale.is_empty() {
            debug!(
                "cache {}: invalidated {} entries depending on {}",
                self.config.namespace,
                stale.len(),
                dependency
            );
        }
        stale.len()
    }

    /// Drop all entries. Hit/miss/eviction/expiration counters keep their
    /// lifetime totals.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.total_size_bytes = 0;
    }

    /// Sweep out every expired entry, returning how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = crate::epoch_ms();
        let mut inner = self.inner.lock().unwrap();
        let expired: Vec<u64> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.record.is_expired(now))
            .map(|(k, _)| *k)
            .collect();
        for key in &expired {
            if let Some(entry) = inner.entries.remove(key) {
                inner.total_size_bytes =
                    inner.total_size_bytes.saturating_sub(entry.record.size_bytes);
                inner.expirations += 1;
            }
        }
        if !expired.is_empty() {
            debug!(
                "cache {}: swept {} expired entries",
                self.config.namespace,
                expired.len()
            );
        }
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        let requests = inner.hits + inner.misses;
        CacheStats {
            item_count: inner.entries.len(),
            total_size_bytes: inner.total_size_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
            hit_ratio: if requests == 0 {
                0.0
            } else {
                inner.hits as f64 / requests as f64
            },
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().entries.is_empty()
    }

    /// Start the periodic expiration sweep. Must be called within a tokio
    /// runtime, on a cloned handle: `cache.clone().spawn_cleanup()`. The
    /// task keeps its handle alive until the returned [`CacheSweeper`] is
    /// dropped or aborted.
    pub fn spawn_cleanup(self: Arc<Self>) -> CacheSweeper {
        let period = Duration::from_millis(self.config.cleanup_interval_ms.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; skip it so the first
            // sweep happens one full period after spawn.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.cleanup();
            }
        });
        CacheSweeper { handle }
    }
}

impl Default for ToolResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Handle to the periodic sweep task. Aborts the task on drop so a cache
/// going out of scope never leaves a sweeper running.
#[derive(Debug)]
pub struct CacheSweeper {
    handle: tokio::task::JoinHandle<()>,
}

impl CacheSweeper {
    /// Stop the sweep immediately. Dropping the sweeper does the same.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A string value whose serialized form is exactly `bytes` long.
    fn payload(bytes: usize) -> Value {
        Value::String("x".repeat(bytes.saturating_sub(2)))
    }

    fn small_cache() -> ToolResultCache {
        ToolResultCache::new(
            CacheConfig::new()
                .with_max_size(500)
                .with_max_result_size(200),
        )
    }

    #[test]
    fn set_and_get_roundtrip() {
        let cache = ToolResultCache::default();
        let params = json!({"path": "/tmp/f.rs"});
        let key = cache.generate_key(&params);

        assert!(cache.set(key, params.clone(), json!({"content": "fn main() {}"}), vec![]));
        let entry = cache.get(key).unwrap();

        assert_eq!(entry.key, key);
        assert_eq!(entry.parameters, params);
        assert_eq!(entry.result, json!({"content": "fn main() {}"}));
        assert_eq!(entry.access_count, 1);
        assert!(entry.valid);
    }

    #[test]
    fn absent_key_is_a_miss() {
        let cache = ToolResultCache::default();
        assert!(cache.get(42).is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn hit_ratio_tracks_requests() {
        let cache = ToolResultCache::default();
        assert_eq!(cache.stats().hit_ratio, 0.0);

        cache.set(1, json!({}), json!("result"), vec![]);
        cache.get(1);
        cache.get(999);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn oversized_result_is_rejected() {
        let cache = small_cache();
        assert!(!cache.set(1, json!({}), payload(300), vec![]));
        assert!(cache.get(1).is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().total_size_bytes, 0);
    }

    #[test]
    fn entry_larger_than_total_budget_is_rejected() {
        // A per-entry cap above the total budget must not admit an entry
        // that alone would exceed the cache.
        let cache =
            ToolResultCache::new(CacheConfig::new().with_max_size(100).with_max_result_size(1000));
        assert!(!cache.set(1, json!({}), payload(500), vec![]));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_size_bytes, 0);
    }

    #[test]
    fn nonpositive_ttl_is_rejected() {
        let cache = ToolResultCache::default();
        assert!(!cache.set_with_ttl(1, json!({}), json!("r"), vec![], 0));
        assert!(!cache.set_with_ttl(1, json!({}), json!("r"), vec![], -5));
        assert!(cache.is_empty());
    }

    #[test]
    fn replacing_a_key_releases_the_old_size() {
        let cache = small_cache();
        cache.set(1, json!({}), payload(150), vec![]);
        cache.set(1, json!({}), payload(42), vec![]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().total_size_bytes, 42);
    }

    #[test]
    fn lru_eviction_removes_stalest_entry() {
        let cache = small_cache();
        cache.set(1, json!({"id": 1}), payload(150), vec![]);
        cache.set(2, json!({"id": 2}), payload(150), vec![]);
        cache.set(3, json!({"id": 3}), payload(150), vec![]);

        // Refresh key 1 so key 2 becomes the least recently used.
        assert!(cache.get(1).is_some());
        cache.set(4, json!({"id": 4}), payload(150), vec![]);

        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none());
        assert!(cache.get(3).is_some());
        assert!(cache.get(4).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn total_size_stays_under_max_across_many_sets() {
        let cache = small_cache();
        for i in 0..20 {
            cache.set(i, json!({"id": i}), payload(150), vec![]);
            assert!(cache.stats().total_size_bytes <= 500);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn invalidate_removes_one_entry() {
        let cache = ToolResultCache::default();
        cache.set(1, json!({}), json!("r"), vec![]);

        assert!(cache.invalidate(1));
        assert!(!cache.invalidate(1));
        assert!(cache.get(1).is_none());
        assert_eq!(cache.stats().total_size_bytes, 0);
    }

    #[test]
    fn dependency_invalidation_removes_exactly_matching_entries() {
        let cache = ToolResultCache::default();
        cache.set(1, json!({}), json!("r1"), vec!["a.rs".to_string()]);
        cache.set(2, json!({}), json!("r2"), vec!["a.rs".to_string(), "b.rs".to_string()]);
        cache.set(3, json!({}), json!("r3"), vec!["c.rs".to_string()]);

        assert_eq!(cache.invalidate_by_dependency("a.rs"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn clear_drops_entries_but_keeps_counters() {
        let cache = ToolResultCache::default();
        cache.set(1, json!({}), json!("r"), vec![]);
        cache.get(1);
        cache.get(999);

        cache.clear();

        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.item_count, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        assert!(cache.set(2, json!({}), json!("again"), vec![]));
        assert!(cache.get(2).is_some());
    }

    #[test]
    fn repeated_gets_refresh_access_metadata() {
        let cache = ToolResultCache::default();
        cache.set(1, json!({}), json!("r"), vec![]);

        cache.get(1);
        let entry = cache.get(1).unwrap();

        assert_eq!(entry.access_count, 2);
        assert!(entry.last_accessed_ms >= entry.timestamp_ms);
    }

    #[test]
    fn default_ttl_is_stamped_on_entries() {
        let cache = ToolResultCache::new(CacheConfig::new().with_default_ttl(12_345));
        cache.set(1, json!({}), json!("r"), vec![]);
        assert_eq!(cache.get(1).unwrap().ttl_ms, 12_345);
    }

    #[test]
    fn generate_key_matches_free_function() {
        let cache = ToolResultCache::default();
        let params = json!({"cmd": "ls", "args": ["-l"]});
        assert_eq!(cache.generate_key(&params), generate_key(&params));
    }

    #[test]
    fn stats_log_string_mentions_items_and_ratio() {
        let stats = CacheStats {
            item_count: 3,
            total_size_bytes: 450,
            hits: 9,
            misses: 1,
            evictions: 1,
            expirations: 2,
            hit_ratio: 0.9,
        };
        let line = stats.to_log_string();
        assert!(line.contains("3 items"));
        assert!(line.contains("450 bytes"));
        assert!(line.contains("90% hit ratio"));
    }

    #[tokio::test]
    async fn ttl_expires_between_reads() {
        let cache = ToolResultCache::default();
        cache.set_with_ttl(1, json!({}), json!("r"), vec![], 500);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get(1).is_some());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(cache.get(1).is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[tokio::test]
    async fn sweeper_removes_expired_entries_on_cadence() {
        let cache = Arc::new(ToolResultCache::new(
            CacheConfig::new().with_cleanup_interval(100),
        ));
        cache.set_with_ttl(1, json!({}), json!("r1"), vec![], 50);
        cache.set_with_ttl(2, json!({}), json!("r2"), vec![], 50);

        let sweeper = cache.clone().spawn_cleanup();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 2);
        drop(sweeper);
    }

    #[tokio::test]
    async fn dropping_the_sweeper_stops_the_sweep() {
        let cache = Arc::new(ToolResultCache::new(
            CacheConfig::new().with_cleanup_interval(50),
        ));
        let sweeper = cache.clone().spawn_cleanup();
        drop(sweeper);

        cache.set_with_ttl(1, json!({}), json!("r"), vec![], 50);
        tokio::time::sleep(Duration::from_millis(250)).await;

        // No sweep ran, so the expired entry is still held until a lazy
        // read removes it.
        assert_eq!(cache.len(), 1);
        assert!(cache.get(1).is_none());
        assert_eq!(cache.len(), 0);
    }
}
