use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use ferrous_resolver_domain::CacheKey;
use rustc_hash::FxBuildHasher;

/// Tracks NXDOMAIN query frequency per key over a rolling window. A domain
/// that keeps coming back NXDOMAIN many times within the window is treated
/// as likely spam/typo traffic and is given a *shorter* negative TTL to
/// bound cache pollution; a domain seen only occasionally keeps the longer,
/// configured `CacheTimeNegative`. This only runs when
/// `Caching.negative_ttl_growth` is enabled — otherwise the flat
/// `CacheTimeNegative` applies to every negative entry.
pub struct NegativeQueryTracker {
    counts: DashMap<CacheKey, (AtomicU32, Instant), FxBuildHasher>,
    window: Duration,
    frequency_threshold: u32,
    frequent_ttl_secs: u32,
}

impl NegativeQueryTracker {
    pub fn new(window: Duration, frequency_threshold: u32, frequent_ttl_secs: u32) -> Self {
        Self {
            counts: DashMap::with_hasher(FxBuildHasher),
            window,
            frequency_threshold,
            frequent_ttl_secs,
        }
    }

    /// Records one more NXDOMAIN for `key` and returns the TTL (seconds) to
    /// cache it for: `rare_ttl_secs` until the key crosses
    /// `frequency_threshold` occurrences within the window, then
    /// `frequent_ttl_secs` for the remainder of the window.
    pub fn record_and_ttl(&self, key: &CacheKey, rare_ttl_secs: u32) -> u32 {
        let now = Instant::now();
        let count = if let Some(mut slot) = self.counts.get_mut(key) {
            if now.duration_since(slot.1) > self.window {
                slot.0.store(1, Ordering::Relaxed);
                slot.1 = now;
                1
            } else {
                slot.0.fetch_add(1, Ordering::Relaxed) + 1
            }
        } else {
            self.counts.insert(key.clone(), (AtomicU32::new(1), now));
            1
        };

        if count > self.frequency_threshold {
            self.frequent_ttl_secs
        } else {
            rare_ttl_secs
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
    fn frequent_domain_gets_shorter_ttl() {
        let tracker = NegativeQueryTracker::new(Duration::from_secs(300), 3, 60);
        let k = key("typo.example.com");
        for _ in 0..3 {
            assert_eq!(tracker.record_and_ttl(&k, 300), 300);
        }
        assert_eq!(tracker.record_and_ttl(&k, 300), 60);
    }

    #[test]
    fn rare_domain_keeps_configured_ttl() {
        let tracker = NegativeQueryTracker::new(Duration::from_secs(300), 5, 60);
        let k = key("once.example.com");
        assert_eq!(tracker.record_and_ttl(&k, 300), 300);
    }

    #[test]
    fn resets_after_window_elapses() {
        let tracker = NegativeQueryTracker::new(Duration::from_millis(1), 1, 60);
        let k = key("example.com");
        assert_eq!(tracker.record_and_ttl(&k, 300), 300);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(tracker.record_and_ttl(&k, 300), 300);
    }
}
