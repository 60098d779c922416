//! Chain-wide metrics bundle, threaded through the Blocking
//! and Dispatch stages the same way [`crate::cache::CacheMetrics`] is
//! already threaded through the Caching stage. Plain atomics, always
//! updated, never read on any hot path — per "Global state... core logic
//! MUST NOT depend on them for correctness". Prometheus emission itself is
//! an external collaborator per; this bundle is what such a collaborator
//! would scrape.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct BlockingMetrics {
    pub blocked: AtomicU64,
    pub allowed: AtomicU64,
}

impl BlockingMetrics {
    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_allowed(&self) {
        self.allowed.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct DispatchMetrics {
    pub successes: AtomicU64,
    pub failures: AtomicU64,
}

impl DispatchMetrics {
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bundle handed to the Blocking and Dispatch stages at construction time.
/// The Caching stage keeps its metrics on [`crate::cache::Cache`] itself
/// (it already owns the map the counters describe); this bundle covers the
/// two stages that have no other natural home for theirs.
#[derive(Default)]
pub struct ChainMetrics {
    pub blocking: BlockingMetrics,
    pub dispatch: DispatchMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let metrics = ChainMetrics::default();
        assert_eq!(metrics.blocking.blocked.load(Ordering::Relaxed), 0);
        metrics.blocking.record_blocked();
        metrics.dispatch.record_success();
        metrics.dispatch.record_failure();
        assert_eq!(metrics.blocking.blocked.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.dispatch.successes.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.dispatch.failures.load(Ordering::Relaxed), 1);
    }
}
