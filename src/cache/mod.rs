//! In-memory LRU cache for rendered tile fragments.
//!
//! ## Memory-Based Eviction
//!
//! The cache uses memory-based eviction rather than entry count. When an
//! insert would exceed the configured memory limit, it evicts ~5% of the
//! limit (by memory, LRU order) in a batch to make room.
//!
//! TTL is enforced lazily on read: an expired entry counts as a miss and is
//! removed at that point.

mod key;

pub use key::CacheKey;

use crate::config::CacheConfig;
use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

// LruCache needs an entry bound but eviction here is memory-driven; at
// typical fragment sizes (1-50 KB) this is far beyond any configured limit.
const LRU_CAPACITY: usize = 1_000_000;

struct CachedFragment {
    data: Bytes,
    inserted_at: Instant,
    ttl: Duration,
}

impl CachedFragment {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Cache statistics.
///
/// All fields are atomic for lock-free reads from the stats endpoints.
#[derive(Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
    pub expired: AtomicU64,
    pub size_bytes: AtomicU64,
    pub entry_count: AtomicU64,
    pub eviction_runs: AtomicU64,
}

impl CacheStats {
    /// Cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }
}

/// In-memory LRU cache for rendered tile fragments.
///
/// Concurrency model follows the registry: a single async RwLock around the
/// LRU list, atomics for stats so readers never block on the lock.
pub struct TileCache {
    cache: Arc<RwLock<LruCache<String, CachedFragment>>>,
    max_bytes: u64,
    default_ttl: Duration,
    stats: Arc<CacheStats>,
}

impl TileCache {
    /// Create a cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.max_size_mb, config.ttl_seconds)
    }

    /// Create a cache with an explicit size limit (MB) and default TTL (seconds).
    pub fn with_limits(max_size_mb: usize, default_ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(LRU_CAPACITY).expect("capacity is non-zero");
        Self {
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
            max_bytes: (max_size_mb as u64) * 1024 * 1024,
            default_ttl: Duration::from_secs(default_ttl_secs),
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// Get a fragment from the cache (None if expired or missing).
    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let mut cache = self.cache.write().await;

        if let Some(entry) = cache.get(key.as_str()) {
            if entry.is_expired() {
                let size = entry.data.len() as u64;
                cache.pop(key.as_str());
                self.stats.expired.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                self.stats.size_bytes.fetch_sub(size, Ordering::Relaxed);
                self.stats.entry_count.fetch_sub(1, Ordering::Relaxed);
                None
            } else {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.data.clone())
            }
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Store a fragment.
    ///
    /// Triggers a batch eviction first if the insert would exceed the memory
    /// limit. Replacing an existing key keeps the entry count constant.
    pub async fn set(&self, key: &CacheKey, data: Bytes, ttl: Option<Duration>) {
        let size = data.len() as u64;
        let mut cache = self.cache.write().await;

        let current = self.stats.size_bytes.load(Ordering::Relaxed);
        if current + size > self.max_bytes {
            self.evict_batch_locked(&mut cache);
        }

        if let Some(existing) = cache.peek(key.as_str()) {
            let existing_size = existing.data.len() as u64;
            self.stats
                .size_bytes
                .fetch_sub(existing_size, Ordering::Relaxed);
        } else {
            self.stats.entry_count.fetch_add(1, Ordering::Relaxed);
        }

        cache.put(
            key.as_str().to_string(),
            CachedFragment {
                data,
                inserted_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
        self.stats.size_bytes.fetch_add(size, Ordering::Relaxed);
    }

    /// Remove a single entry.
    ///
    /// Returns true if an entry existed. Used by the refresh warmer to
    /// force a re-render past an otherwise valid cached fragment.
    pub async fn remove(&self, key: &CacheKey) -> bool {
        let mut cache = self.cache.write().await;
        match cache.pop(key.as_str()) {
            Some(entry) => {
                self.stats
                    .size_bytes
                    .fetch_sub(entry.data.len() as u64, Ordering::Relaxed);
                self.stats.entry_count.fetch_sub(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Remove every cached variant of a tile.
    ///
    /// Returns the number of entries removed. Used after a callback dispatch
    /// so the next read re-renders with fresh inputs.
    pub async fn invalidate_tile(&self, tile_id: &str) -> usize {
        let prefix = CacheKey::tile_prefix(tile_id);
        let mut cache = self.cache.write().await;

        let doomed: Vec<String> = cache
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();

        let mut freed = 0u64;
        for key in &doomed {
            if let Some(entry) = cache.pop(key) {
                freed += entry.data.len() as u64;
            }
        }
        self.stats.size_bytes.fetch_sub(freed, Ordering::Relaxed);
        self.stats
            .entry_count
            .fetch_sub(doomed.len() as u64, Ordering::Relaxed);
        doomed.len()
    }

    /// Evict ~5% of the memory limit in LRU order.
    ///
    /// Takes the already-locked cache to avoid a race between the size check
    /// and the eviction. Returns (entries_evicted, bytes_freed).
    fn evict_batch_locked(&self, cache: &mut LruCache<String, CachedFragment>) -> (usize, u64) {
        let target_free = self.max_bytes / 20;
        let mut bytes_freed = 0u64;
        let mut entries_evicted = 0usize;

        while bytes_freed < target_free {
            if let Some((_, evicted)) = cache.pop_lru() {
                bytes_freed += evicted.data.len() as u64;
                entries_evicted += 1;
            } else {
                break; // Cache is empty
            }
        }

        self.stats
            .size_bytes
            .fetch_sub(bytes_freed, Ordering::Relaxed);
        self.stats
            .entry_count
            .fetch_sub(entries_evicted as u64, Ordering::Relaxed);
        self.stats
            .evictions
            .fetch_add(entries_evicted as u64, Ordering::Relaxed);
        self.stats.eviction_runs.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            entries_evicted,
            bytes_freed,
            max_bytes = self.max_bytes,
            "tile cache batch eviction completed"
        );

        (entries_evicted, bytes_freed)
    }

    /// Clear all entries and reset statistics.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();

        self.stats.hits.store(0, Ordering::Relaxed);
        self.stats.misses.store(0, Ordering::Relaxed);
        self.stats.evictions.store(0, Ordering::Relaxed);
        self.stats.expired.store(0, Ordering::Relaxed);
        self.stats.size_bytes.store(0, Ordering::Relaxed);
        self.stats.entry_count.store(0, Ordering::Relaxed);
        self.stats.eviction_runs.store(0, Ordering::Relaxed);
    }

    /// Shared statistics handle.
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub async fn len(&self) -> usize {
        self.stats.entry_count.load(Ordering::Relaxed) as usize
    }

    pub async fn is_empty(&self) -> bool {
        self.stats.entry_count.load(Ordering::Relaxed) == 0
    }
}
