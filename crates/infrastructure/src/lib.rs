//! Ferrous-Resolver infrastructure layer.
//!
//! Every concrete implementation of the `application::ports` traits: the DNS
//! wire codec, upstream transports (UDP/TCP/DoT/DoH), the weighted group
//! dispatcher, the upstream tree, the TTL cache, the blacklist/whitelist
//! engine, the client-names resolver, the small filter stages, and the
//! chain assembly that wires them all together.

pub mod blocking;
pub mod bootstrap;
pub mod cache;
pub mod chain;
pub mod client_names;
pub mod dispatch;
pub mod filters;
pub mod metrics;
pub mod reload;
pub mod transport;
pub mod upstream_tree;
pub mod wire;

pub use chain::build_chain;
pub use metrics::ChainMetrics;
pub use reload::{BlocklistReload, CacheCompaction};
