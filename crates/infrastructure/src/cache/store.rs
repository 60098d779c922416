use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use ferrous_resolver_domain::CacheKey;
use rustc_hash::FxBuildHasher;
use tracing::debug;

use super::entry::CacheEntry;
use super::metrics::CacheMetrics;
use super::publisher::{CachePublisher, NoopPublisher};

/// `CacheKey -> PackedWire` map with capacity `max_items`. Eviction on
/// overflow is random-victim rather than LRU: it's O(1) and needs no extra
/// bookkeeping on the hot path.
pub struct Cache {
    entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
    max_items: usize,
    pub metrics: CacheMetrics,
    publisher: Arc<dyn CachePublisher>,
    receiving_remote: AtomicBool,
}

impl Cache {
    pub fn new(max_items: usize) -> Self {
        Self::with_publisher(max_items, Arc::new(NoopPublisher))
    }

    pub fn with_publisher(max_items: usize, publisher: Arc<dyn CachePublisher>) -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            max_items,
            metrics: CacheMetrics::default(),
            publisher,
            receiving_remote: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the stored wire bytes and the elapsed time since insertion (so
    /// the caller can age every RR's TTL down by that amount), evicting the
    /// entry as a miss if it has expired (cache invariant c "cache
    /// corruption ... evict on read" covers decode failures in the resolver
    /// layer above this).
    pub fn get(&self, key: &CacheKey) -> Option<(Arc<[u8]>, u32, bool)> {
        let now = Instant::now();
        let hit = self.entries.get(key).and_then(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some((entry.wire.clone(), entry.elapsed_secs(now), entry.is_negative))
            }
        });

        match hit {
            Some(v) => {
                self.metrics.record_hit();
                Some(v)
            }
            None => {
                self.entries.remove(key);
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Stores `wire` under `key` with `ttl_secs`, evicting a random entry
    /// first if at capacity (property 2: bound holds under any load).
    /// Publishing to the cross-instance channel happens after the local
    /// write completes,.
    pub fn put(&self, key: CacheKey, wire: Arc<[u8]>, ttl_secs: u32, is_negative: bool) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_items {
            self.evict_one();
        }
        self.entries
            .insert(key.clone(), CacheEntry::new(Arc::clone(&wire), ttl_secs, is_negative));
        self.metrics.record_insertion();

        if !self.receiving_remote.load(Ordering::Relaxed) {
            self.publisher.publish(&key, &wire, ttl_secs, is_negative);
        }
    }

    /// Applies a remote `Put` without re-publishing, avoiding a pub/sub loop
    /// across instances ("receiver path MUST take a publish=false
    /// shortcut").
    pub fn put_from_remote(&self, key: CacheKey, wire: Arc<[u8]>, ttl_secs: u32, is_negative: bool) {
        self.receiving_remote.store(true, Ordering::Relaxed);
        self.put(key, wire, ttl_secs, is_negative);
        self.receiving_remote.store(false, Ordering::Relaxed);
    }

    /// Sweeps every expired entry, used by the background compaction job
    /// rather than relying solely on lazy eviction at read time. Returns the
    /// number of entries removed.
    pub fn compact_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    fn evict_one(&self) {
        if let Some(victim) = self.entries.iter().next().map(|e| e.key().clone()) {
            self.entries.remove(&victim);
            self.metrics.record_eviction();
            debug!(name = %victim.name, "evicted cache entry at capacity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::RecordType;

    fn key(name: &str) -> CacheKey {
        CacheKey::new(name, RecordType::A)
    }

    #[test]
    fn miss_then_hit() {
        let cache = Cache::new(10);
        assert!(cache.get(&key("example.com")).is_none());
        cache.put(key("example.com"), Arc::from(b"wire".to_vec().into_boxed_slice()), 60, false);
        let (wire, elapsed, negative) = cache.get(&key("example.com")).unwrap();
        assert_eq!(&*wire, b"wire");
        assert_eq!(elapsed, 0);
        assert!(!negative);
    }

    #[test]
    fn respects_capacity_bound() {
        let cache = Cache::new(4);
        for i in 0..20 {
            cache.put(
                key(&format!("host{i}.example.com")),
                Arc::from(Vec::<u8>::new().into_boxed_slice()),
                60,
                false,
            );
            assert!(cache.len() <= 4);
        }
    }

    #[test]
    fn remote_put_does_not_republish() {
        struct CountingPublisher(std::sync::atomic::AtomicUsize);
        impl CachePublisher for CountingPublisher {
            fn publish(&self, _key: &CacheKey, _wire: &Arc<[u8]>, _ttl: u32, _neg: bool) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }
        let publisher = Arc::new(CountingPublisher(std::sync::atomic::AtomicUsize::new(0)));
        let cache = Cache::with_publisher(10, publisher.clone());
        cache.put_from_remote(
            key("example.com"),
            Arc::from(Vec::<u8>::new().into_boxed_slice()),
            60,
            false,
        );
        assert_eq!(publisher.0.load(Ordering::Relaxed), 0);
        cache.put(key("other.com"), Arc::from(Vec::<u8>::new().into_boxed_slice()), 60, false);
        assert_eq!(publisher.0.load(Ordering::Relaxed), 1);
    }
}
