pub mod dot;
pub mod doh;
pub mod udp_tcp;

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::{BootstrapResolver, UpstreamClient, UpstreamReply};
use ferrous_resolver_domain::{ClientProtocol, ResolverError, Upstream, UpstreamProtocol};
use tracing::{debug, warn};

use self::doh::DohClient;
use self::dot::DotClient;
use self::udp_tcp::UdpTcpClient;

/// Dispatches a single attempt to the protocol-specific transport. One
/// call = one IP, one protocol round-trip; retry/rotation lives one layer up
/// in [`RetryingUpstreamClient`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtocolClient {
    pub client_protocol: ClientProtocol,
}

#[async_trait]
impl UpstreamClient for ProtocolClient {
    async fn call(
        &self,
        query: &[u8],
        addr: SocketAddr,
        upstream: &Upstream,
    ) -> Result<UpstreamReply, ResolverError> {
        let (bytes, rtt) = match upstream.protocol {
            UpstreamProtocol::TcpUdp => {
                UdpTcpClient
                    .send(query, addr, self.client_protocol, upstream.timeout)
                    .await?
            }
            UpstreamProtocol::Tls => {
                let sni = upstream.sni_name();
                DotClient.send(query, addr, &sni, upstream.timeout).await?
            }
            UpstreamProtocol::Https => {
                let path = upstream.path.as_deref().unwrap_or("/dns-query");
                DohClient
                    .send(
                        query,
                        addr,
                        &upstream.host,
                        path,
                        upstream.proxy.as_deref(),
                        upstream.timeout,
                    )
                    .await?
            }
        };
        Ok(UpstreamReply {
            wire: Arc::from(bytes.into_boxed_slice()),
            rtt,
        })
    }
}

/// Wraps [`ProtocolClient`] with the retry contract: "up to 3 attempts
/// per query on net-timeout errors only; between attempts rotate to the next
/// known upstream IP from Bootstrap's resolution list (round-robin)."
///
/// `client_protocol` is taken per call rather than fixed at construction, so
/// a single dispatcher instance correctly prefers TCP upstream for a TCP
/// client and UDP (with truncation fallback) for a UDP client.
pub struct RetryingUpstreamClient {
    bootstrap: Arc<dyn BootstrapResolver>,
}

const MAX_ATTEMPTS: usize = 3;

impl RetryingUpstreamClient {
    pub fn new(bootstrap: Arc<dyn BootstrapResolver>) -> Self {
        Self { bootstrap }
    }

    pub async fn call(
        &self,
        query: &[u8],
        upstream: &Upstream,
        client_protocol: ClientProtocol,
    ) -> Result<UpstreamReply, ResolverError> {
        let ips = self.bootstrap.upstream_ips(upstream).await?;
        if ips.is_empty() {
            return Err(ResolverError::NoSuchHost(upstream.host.to_string()));
        }

        let inner = ProtocolClient { client_protocol };
        let mut last_err = ResolverError::Timeout;
        for attempt in 0..MAX_ATTEMPTS {
            let ip = ips[attempt % ips.len()];
            let addr = SocketAddr::new(ip, upstream.port);
            match inner.call(query, addr, upstream).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transport_retryable() && matches!(e, ResolverError::Timeout) => {
                    debug!(attempt, %addr, "upstream timeout, rotating IP");
                    last_err = e;
                    continue;
                }
                Err(e) => {
                    warn!(%addr, error = %e, "upstream call failed");
                    return Err(e);
                }
            }
        }
        Err(last_err)
    }
}
