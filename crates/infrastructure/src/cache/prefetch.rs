use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use ferrous_resolver_domain::CacheKey;
use rustc_hash::FxBuildHasher;

/// Per-key access counter over a rolling window of length `window` (
/// "Prefetching"). Capped at `max_items`; once full, new keys are dropped
/// rather than evicting hot ones, keeping the side table itself O(1) to grow.
pub struct PrefetchTracker {
    counts: DashMap<CacheKey, (AtomicU32, Instant), FxBuildHasher>,
    window: std::time::Duration,
    threshold: u32,
    max_items: usize,
}

impl PrefetchTracker {
    pub fn new(window: std::time::Duration, threshold: u32, max_items: usize) -> Self {
        Self {
            counts: DashMap::with_hasher(FxBuildHasher),
            window,
            threshold,
            max_items,
        }
    }

    /// Records an access; returns `true` once the key has crossed
    /// `threshold` accesses within the current window, signalling that a
    /// background prefetch should be scheduled when the entry next expires.
    pub fn record_access(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        if let Some(mut slot) = self.counts.get_mut(key) {
            if now.duration_since(slot.1) > self.window {
                slot.0.store(1, Ordering::Relaxed);
                slot.1 = now;
                return false;
            }
            let count = slot.0.fetch_add(1, Ordering::Relaxed) + 1;
            return count >= self.threshold;
        }

        if self.counts.len() < self.max_items {
            self.counts.insert(key.clone(), (AtomicU32::new(1), now));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::RecordType;
    use std::time::Duration;

    #[test]
    fn crosses_threshold_after_enough_accesses() {
        let tracker = PrefetchTracker::new(Duration::from_secs(600), 3, 1000);
        let key = CacheKey::new("hot.example.com", RecordType::A);
        assert!(!tracker.record_access(&key));
        assert!(!tracker.record_access(&key));
        assert!(tracker.record_access(&key));
    }

    #[test]
    fn resets_after_window_elapses() {
        let tracker = PrefetchTracker::new(Duration::from_millis(1), 2, 1000);
        let key = CacheKey::new("example.com", RecordType::A);
        tracker.record_access(&key);
        std::thread::sleep(Duration::from_millis(5));
        assert!(!tracker.record_access(&key));
    }
}
