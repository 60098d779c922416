use std::sync::Arc;
use std::time::Instant;

/// One cached wire message (`CacheValue`). `ttl_secs` is the TTL as it
/// stood at insertion time; remaining TTL is derived from `stored_at` on
/// every read so two successive reads never observe an increasing value
/// (property 1).
#[derive(Clone)]
pub struct CacheEntry {
    pub wire: Arc<[u8]>,
    pub stored_at: Instant,
    pub ttl_secs: u32,
    pub is_negative: bool,
}

impl CacheEntry {
    pub fn new(wire: Arc<[u8]>, ttl_secs: u32, is_negative: bool) -> Self {
        Self {
            wire,
            stored_at: Instant::now(),
            ttl_secs,
            is_negative,
        }
    }

    pub fn elapsed_secs(&self, now: Instant) -> u32 {
        now.saturating_duration_since(self.stored_at).as_secs() as u32
    }

    pub fn remaining_ttl(&self, now: Instant) -> u32 {
        self.ttl_secs.saturating_sub(self.elapsed_secs(now))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed_secs(now) >= self.ttl_secs
    }
}
