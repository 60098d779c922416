//! `Bootstrap` : resolves the IPs behind an upstream's `host` without
//! itself needing recursion, and caches the result for
//! [`RetryingUpstreamClient`]'s round-robin rotation.
//!
//! A bootstrap upstream configured with a plain UDP/TCP protocol must name a
//! literal IP (enforced at config-validation time); an encrypted one dials
//! its own `hardcoded_ips` directly and uses `host` only as the TLS SNI.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use ferrous_resolver_application::ports::BootstrapResolver;
use ferrous_resolver_domain::{BootstrapDnsConfig, ResolverError, Upstream, UpstreamProtocol};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType as HickoryRecordType};
use tracing::{debug, warn};

use crate::transport::udp_tcp::UdpTcpClient;
use crate::wire;

const CACHE_TTL: Duration = Duration::from_secs(300);
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

struct CachedIps {
    ips: Vec<IpAddr>,
    resolved_at: Instant,
}

/// Resolves upstream hostnames for dialing,. When no
/// `BootstrapDnsConfig` is supplied, falls back to the OS system resolver.
pub struct Bootstrap {
    config: Option<BootstrapDnsConfig>,
    cache: DashMap<Arc<str>, CachedIps>,
}

impl Bootstrap {
    pub fn new(config: Option<BootstrapDnsConfig>) -> Self {
        Self {
            config,
            cache: DashMap::new(),
        }
    }

    /// Dial targets for the bootstrap upstream itself: hardcoded IPs for an
    /// encrypted bootstrap, or its literal-IP host for plain UDP/TCP.
    fn bootstrap_targets(&self, config: &BootstrapDnsConfig) -> Vec<SocketAddr> {
        match config.protocol {
            UpstreamProtocol::TcpUdp => config
                .host
                .parse::<IpAddr>()
                .map(|ip| vec![SocketAddr::new(ip, config.port)])
                .unwrap_or_default(),
            UpstreamProtocol::Tls | UpstreamProtocol::Https => config
                .ips
                .iter()
                .map(|ip| SocketAddr::new(*ip, config.port))
                .collect(),
        }
    }

    async fn resolve_via_bootstrap(&self, host: &str) -> Result<Vec<IpAddr>, ResolverError> {
        let Some(config) = &self.config else {
            return resolve_via_os(host).await;
        };
        let targets = self.bootstrap_targets(config);
        let Some(target) = targets.first().copied() else {
            return Err(ResolverError::NoSuchHost(host.to_string()));
        };

        let mut ips = Vec::new();
        for record_type in [HickoryRecordType::A, HickoryRecordType::AAAA] {
            match query_one(host, record_type, target).await {
                Ok(mut found) => ips.append(&mut found),
                Err(e) => debug!(host, ?record_type, error = %e, "bootstrap query failed"),
            }
        }
        if ips.is_empty() {
            return Err(ResolverError::NoSuchHost(host.to_string()));
        }
        Ok(ips)
    }
}

#[async_trait]
impl BootstrapResolver for Bootstrap {
    async fn upstream_ips(&self, upstream: &Upstream) -> Result<Vec<SocketAddr>, ResolverError> {
        if let Ok(ip) = upstream.host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, upstream.port)]);
        }

        if let Some(cached) = self.cache.get(&upstream.host) {
            if cached.resolved_at.elapsed() < CACHE_TTL {
                return Ok(cached
                    .ips
                    .iter()
                    .map(|ip| SocketAddr::new(*ip, upstream.port))
                    .collect());
            }
        }

        let ips = self.resolve_via_bootstrap(&upstream.host).await?;
        self.cache.insert(
            upstream.host.clone(),
            CachedIps {
                ips: ips.clone(),
                resolved_at: Instant::now(),
            },
        );
        Ok(ips
            .into_iter()
            .map(|ip| SocketAddr::new(ip, upstream.port))
            .collect())
    }
}

async fn resolve_via_os(host: &str) -> Result<Vec<IpAddr>, ResolverError> {
    let lookup = format!("{host}:0");
    tokio::net::lookup_host(lookup)
        .await
        .map(|iter| iter.map(|addr| addr.ip()).collect::<Vec<_>>())
        .map_err(|e| ResolverError::NoSuchHost(format!("{host}: {e}")))
        .and_then(|ips| {
            if ips.is_empty() {
                Err(ResolverError::NoSuchHost(host.to_string()))
            } else {
                Ok(ips)
            }
        })
}

async fn query_one(
    host: &str,
    record_type: HickoryRecordType,
    target: SocketAddr,
) -> Result<Vec<IpAddr>, ResolverError> {
    let name = Name::from_ascii(if host.ends_with('.') {
        host.to_string()
    } else {
        format!("{host}.")
    })
    .map_err(|e| ResolverError::Internal(e.to_string()))?;

    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut msg = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    msg.set_recursion_desired(true);
    msg.add_query(query);
    let bytes = wire::to_bytes(&msg)?;

    let (response_bytes, _rtt) = UdpTcpClient
        .send(
            &bytes,
            target,
            ferrous_resolver_domain::ClientProtocol::Udp,
            RESOLVE_TIMEOUT,
        )
        .await?;

    let response = wire::parse(&response_bytes)?;
    if wire::is_server_error(&response) {
        return Err(ResolverError::UpstreamServerError(format!(
            "bootstrap server error resolving {host}"
        )));
    }

    let ips = response
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect::<Vec<_>>();
    if ips.is_empty() {
        warn!(host, "bootstrap query returned no address records");
    }
    Ok(ips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn literal_ip_host_returns_directly_without_network() {
        let bootstrap = Bootstrap::new(None);
        let upstream = Upstream {
            protocol: UpstreamProtocol::TcpUdp,
            host: Arc::from("9.9.9.9"),
            port: 53,
            path: None,
            common_name: None,
            timeout: Duration::from_millis(50),
            proxy: None,
        };
        let ips = bootstrap.upstream_ips(&upstream).await.unwrap();
        assert_eq!(ips, vec!["9.9.9.9:53".parse::<SocketAddr>().unwrap()]);
    }
}
