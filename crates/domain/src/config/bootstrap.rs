use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;

use crate::errors::ResolverError;
use crate::upstream::UpstreamProtocol;

/// `BootstrapDNS.{Upstream, IPs}`.
///
/// The bootstrap upstream resolves hostnames of *other* upstreams without
/// itself needing recursion. Plain UDP/TCP bootstrap upstreams must name a
/// literal IP; encrypted ones must carry `ips` to dial by, with `host` kept
/// only as the TLS SNI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapDnsConfig {
    #[serde(default)]
    pub protocol: UpstreamProtocol,
    pub host: Arc<str>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub ips: Vec<IpAddr>,
}

fn default_port() -> u16 {
    53
}

impl BootstrapDnsConfig {
    /// Validates the invariants at startup.
    pub fn validate(&self) -> Result<(), ResolverError> {
        match self.protocol {
            UpstreamProtocol::TcpUdp => {
                if self.host.parse::<IpAddr>().is_err() {
                    return Err(ResolverError::Config(format!(
                        "bootstrap upstream '{}' must be a literal IP for plain UDP/TCP",
                        self.host
                    )));
                }
                Ok(())
            }
            UpstreamProtocol::Tls | UpstreamProtocol::Https => {
                if self.ips.is_empty() {
                    return Err(ResolverError::MissingBootstrapIps(self.host.to_string()));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bootstrap_requires_ip_literal_host() {
        let cfg = BootstrapDnsConfig {
            protocol: UpstreamProtocol::TcpUdp,
            host: Arc::from("dns.example"),
            port: 53,
            ips: vec![],
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn encrypted_bootstrap_requires_hardcoded_ips() {
        let cfg = BootstrapDnsConfig {
            protocol: UpstreamProtocol::Https,
            host: Arc::from("dns.example"),
            port: 443,
            ips: vec![],
        };
        assert!(cfg.validate().is_err());

        let cfg2 = BootstrapDnsConfig {
            ips: vec!["9.9.9.9".parse().unwrap()],
            ..cfg
        };
        assert!(cfg2.validate().is_ok());
    }
}
