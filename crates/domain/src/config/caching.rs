use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `Caching.*` configuration surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachingConfig {
    #[serde(default = "default_min_caching_secs", with = "secs")]
    pub min_caching_time: Duration,

    #[serde(default = "default_max_caching_secs", with = "secs")]
    pub max_caching_time: Duration,

    /// TTL applied to a negative (NXDOMAIN) cache entry. A `max_caching_time`
    /// of zero disables caching entirely.
    #[serde(default = "default_negative_secs", with = "secs")]
    pub cache_time_negative: Duration,

    /// When set, a key that comes back NXDOMAIN more than
    /// `negative_frequency_threshold` times within a 5-minute window is
    /// treated as likely spam/typo traffic and capped at the shorter
    /// `negative_frequent_ttl` instead of `cache_time_negative`. Off by
    /// default, in which case `cache_time_negative` alone governs negative
    /// TTLs.
    #[serde(default)]
    pub negative_ttl_growth: bool,

    #[serde(default = "default_negative_frequency_threshold")]
    pub negative_frequency_threshold: u32,

    #[serde(default = "default_negative_frequent_secs", with = "secs")]
    pub negative_frequent_ttl: Duration,

    #[serde(default = "default_max_items")]
    pub max_items_count: usize,

    #[serde(default)]
    pub prefetching: bool,

    #[serde(default = "default_prefetch_threshold")]
    pub prefetch_threshold: u32,

    #[serde(default = "default_prefetch_expires_secs", with = "secs")]
    pub prefetch_expires: Duration,

    #[serde(default = "default_prefetch_max_items")]
    pub prefetch_max_items_count: usize,

    /// `/regex/`-style strings; matching qnames are never cached.
    #[serde(default)]
    pub exclude: Vec<String>,
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

fn default_min_caching_secs() -> Duration {
    Duration::from_secs(0)
}

fn default_max_caching_secs() -> Duration {
    Duration::from_secs(24 * 3600)
}

fn default_negative_secs() -> Duration {
    Duration::from_secs(60)
}

fn default_negative_frequency_threshold() -> u32 {
    5
}

fn default_negative_frequent_secs() -> Duration {
    Duration::from_secs(60)
}

fn default_max_items() -> usize {
    200_000
}

fn default_prefetch_threshold() -> u32 {
    5
}

fn default_prefetch_expires_secs() -> Duration {
    Duration::from_secs(600)
}

fn default_prefetch_max_items() -> usize {
    10_000
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            min_caching_time: default_min_caching_secs(),
            max_caching_time: default_max_caching_secs(),
            cache_time_negative: default_negative_secs(),
            negative_ttl_growth: false,
            negative_frequency_threshold: default_negative_frequency_threshold(),
            negative_frequent_ttl: default_negative_frequent_secs(),
            max_items_count: default_max_items(),
            prefetching: false,
            prefetch_threshold: default_prefetch_threshold(),
            prefetch_expires: default_prefetch_expires_secs(),
            prefetch_max_items_count: default_prefetch_max_items(),
            exclude: Vec::new(),
        }
    }
}

impl CachingConfig {
    /// A zero `max_caching_time` together with a zero `cache_time_negative`
    /// turns the whole caching stage off.
    pub fn caching_disabled(&self) -> bool {
        self.max_caching_time.is_zero() && self.cache_time_negative.is_zero()
    }

    /// `adjust(min RR TTL, [MinCachingTime, MaxCachingTime])`.
    pub fn clamp_positive_ttl(&self, min_rr_ttl_secs: u32) -> u32 {
        let min = self.min_caching_time.as_secs() as u32;
        let max = self.max_caching_time.as_secs() as u32;
        min_rr_ttl_secs.clamp(min, max.max(min))
    }
}
