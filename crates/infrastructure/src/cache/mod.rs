pub mod entry;
pub mod metrics;
pub mod negative_tracker;
pub mod prefetch;
pub mod publisher;
pub mod resolver;
pub mod store;

pub use entry::CacheEntry;
pub use metrics::CacheMetrics;
pub use negative_tracker::NegativeQueryTracker;
pub use prefetch::PrefetchTracker;
pub use publisher::{CachePublisher, NoopPublisher};
pub use resolver::CachingResolver;
pub use store::Cache;
