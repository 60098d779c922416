use async_trait::async_trait;
use ferrous_resolver_domain::{ResolverError, Upstream};
use std::net::SocketAddr;

/// `Bootstrap.UpstreamIPs(upstream) -> RotatingIPList`.
///
/// Resolves the dial targets for an upstream without recursion: literal IPs
/// pass through directly, hostnames are resolved via the bootstrap upstream
/// (or the OS resolver when none is configured).
#[async_trait]
pub trait BootstrapResolver: Send + Sync {
    /// Returns the current rotation of IPs for `upstream`, re-resolving on
    /// demand if the cached list has gone stale. The dispatcher/retry layer
    /// advances through this list round-robin on retry.
    async fn upstream_ips(&self, upstream: &Upstream) -> Result<Vec<SocketAddr>, ResolverError>;
}
