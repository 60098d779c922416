//! `ClientNamesResolver` : resolves a client IP to one or more display
//! names, static mapping first and a PTR query as fallback, cached 1 hour.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{ClientLookupConfig, Request, ResolverError, Response, StaticClientNameMapping};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType as HickoryRecordType};
use tracing::{debug, info};

use super::cache::ClientNamesCache;
use crate::transport::udp_tcp::UdpTcpClient;
use crate::wire;

const PTR_TIMEOUT: Duration = Duration::from_secs(3);

/// Assigns `request.client_names` before handing off to `next`.
pub struct ClientNamesResolver {
    static_mapping: StaticClientNameMapping,
    upstream: Option<SocketAddr>,
    single_name_order: Option<usize>,
    cache: ClientNamesCache,
    next: Arc<dyn ChainStage>,
}

impl ClientNamesResolver {
    pub fn new(config: &ClientLookupConfig, next: Arc<dyn ChainStage>) -> Result<Self, ResolverError> {
        let upstream = config
            .upstream
            .as_ref()
            .map(|addr| {
                addr.parse::<SocketAddr>()
                    .map_err(|e| ResolverError::Config(format!("ClientLookup.Upstream '{addr}': {e}")))
            })
            .transpose()?;

        Ok(Self {
            static_mapping: config.static_mapping(),
            upstream,
            single_name_order: config.single_name_order,
            cache: ClientNamesCache::new(),
            next,
        })
    }

    async fn names_for(&self, ip: IpAddr) -> Vec<Arc<str>> {
        if let Some(cached) = self.cache.get(ip) {
            return cached;
        }

        let static_names = self.static_mapping.names_for(ip);
        let names = if !static_names.is_empty() {
            static_names
        } else if let Some(upstream) = self.upstream {
            match ptr_lookup(ip, upstream).await {
                Ok(mut found) if !found.is_empty() => {
                    if let Some(order) = self.single_name_order {
                        match found.drain(..).nth(order.saturating_sub(1)) {
                            Some(name) => vec![name],
                            None => vec![Arc::from(ip.to_string())],
                        }
                    } else {
                        found
                    }
                }
                Ok(_) => vec![Arc::from(ip.to_string())],
                Err(e) => {
                    debug!(%ip, error = %e, "PTR lookup failed, falling back to raw IP");
                    vec![Arc::from(ip.to_string())]
                }
            }
        } else {
            vec![Arc::from(ip.to_string())]
        };

        self.cache.put(ip, names.clone());
        names
    }
}

#[async_trait]
impl ChainStage for ClientNamesResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        if request.client_id.is_some() {
            return self.next.resolve(request).await;
        }
        let names = self.names_for(request.client_ip).await;
        let enriched = request.with_client_names(names);
        self.next.resolve(&enriched).await
    }

    fn stage_type(&self) -> &'static str {
        "client_names"
    }

    fn log_config(&self) {
        info!(
            has_upstream = self.upstream.is_some(),
            single_name_order = ?self.single_name_order,
            "client names stage configured"
        );
    }
}

fn reverse_name(ip: IpAddr) -> Result<Name, ResolverError> {
    let label = match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            format!("{}.{}.{}.{}.in-addr.arpa.", o[3], o[2], o[1], o[0])
        }
        IpAddr::V6(v6) => {
            let nibbles: Vec<String> = v6
                .octets()
                .iter()
                .rev()
                .flat_map(|b| [format!("{:x}", b & 0x0f), format!("{:x}", (b >> 4) & 0x0f)])
                .collect();
            format!("{}.ip6.arpa.", nibbles.join("."))
        }
    };
    Name::from_ascii(&label).map_err(|e| ResolverError::Internal(e.to_string()))
}

async fn ptr_lookup(ip: IpAddr, upstream: SocketAddr) -> Result<Vec<Arc<str>>, ResolverError> {
    let name = reverse_name(ip)?;

    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(HickoryRecordType::PTR);
    query.set_query_class(DNSClass::IN);

    let mut msg = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    msg.set_recursion_desired(true);
    msg.add_query(query);
    let bytes = wire::to_bytes(&msg)?;

    let (response_bytes, _rtt) = UdpTcpClient
        .send(&bytes, upstream, ferrous_resolver_domain::ClientProtocol::Udp, PTR_TIMEOUT)
        .await?;

    let response = wire::parse(&response_bytes)?;
    let names = response
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::PTR(ptr) => Some(Arc::from(ptr.to_utf8().trim_end_matches('.'))),
            _ => None,
        })
        .collect();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn reverse_name_v4() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5));
        assert_eq!(reverse_name(ip).unwrap().to_utf8(), "5.1.168.192.in-addr.arpa.");
    }
}
