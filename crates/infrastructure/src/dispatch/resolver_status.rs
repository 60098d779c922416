use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-upstream error memory (`ResolverStatus`). `last_error_epoch`
/// is an atomic Unix-epoch second timestamp, initialized to zero so a fresh
/// upstream starts at full weight once an hour has "passed" since the epoch.
#[derive(Debug, Default)]
pub struct ResolverStatus {
    last_error_epoch: AtomicU64,
}

const BASE_WEIGHT: u64 = 60;
const RECOVERY_SECS: u64 = 3600;

impl ResolverStatus {
    pub fn new() -> Self {
        Self {
            last_error_epoch: AtomicU64::new(0),
        }
    }

    /// Records a non-cancellation error at the current time: an upstream
    /// that returns an error has its last-error timestamp set to now,
    /// atomically, so concurrent callers never race on a stale read.
    pub fn record_error(&self) {
        self.last_error_epoch.store(now_epoch(), Ordering::Relaxed);
    }

    /// `weight = 60` once an hour has passed since the last error, else
    /// `max(1, minutes_since_error)` — weight recovers linearly from 1 (just
    /// after an error) back up to 60 over the following hour.
    pub fn weight(&self) -> u64 {
        let last = self.last_error_epoch.load(Ordering::Relaxed);
        if last == 0 {
            return BASE_WEIGHT;
        }
        let elapsed = now_epoch().saturating_sub(last);
        if elapsed >= RECOVERY_SECS {
            return BASE_WEIGHT;
        }
        let minutes_since_error = elapsed / 60;
        minutes_since_error.max(1)
    }
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_status_is_full_weight() {
        let status = ResolverStatus::new();
        assert_eq!(status.weight(), BASE_WEIGHT);
    }

    #[test]
    fn recorded_error_drops_weight_to_minimum() {
        let status = ResolverStatus::new();
        status.record_error();
        assert_eq!(status.weight(), 1);
    }
}
