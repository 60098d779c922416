use std::sync::Arc;

use ferrous_resolver_domain::CacheKey;

/// Cross-instance cache sync hook. A real implementation wires
/// this to a Redis-like pub/sub channel; the default no-op sink keeps the
/// cache correct and fully local when no such channel is configured.
pub trait CachePublisher: Send + Sync {
    fn publish(&self, key: &CacheKey, wire: &Arc<[u8]>, ttl_secs: u32, is_negative: bool);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl CachePublisher for NoopPublisher {
    fn publish(&self, _key: &CacheKey, _wire: &Arc<[u8]>, _ttl_secs: u32, _is_negative: bool) {}
}
