use async_trait::async_trait;
use ferrous_resolver_domain::{ResolverError, Upstream};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// One attempt's outcome: the raw wire response and the observed round-trip
/// time, used by the dispatcher's weighted-selection bookkeeping.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub wire: Arc<[u8]>,
    pub rtt: Duration,
}

/// `UpstreamClient.Call(ctx, msg, ipURL, protocol) -> (msg, rtt, error)`.
///
/// One implementation per wire protocol (UDP/TCP, DoT, DoH); the dispatcher
/// is protocol-agnostic and only ever sees this trait.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn call(
        &self,
        query: &[u8],
        addr: SocketAddr,
        upstream: &Upstream,
    ) -> Result<UpstreamReply, ResolverError>;
}
