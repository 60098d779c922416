use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Wire protocol towards an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamProtocol {
    #[default]
    /// Plain UDP with automatic TCP fallback on truncation.
    #[serde(rename = "tcp+udp")]
    TcpUdp,
    /// DNS-over-TLS.
    #[serde(rename = "tcp-tls")]
    Tls,
    /// DNS-over-HTTPS.
    #[serde(rename = "https")]
    Https,
}

/// A single configured remote DNS server. `host` may be a DNS name or a
/// literal IP; DoT/DoH require [`crate::bootstrap::BootstrapConfig`] to
/// resolve it first.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Upstream {
    pub protocol: UpstreamProtocol,
    pub host: Arc<str>,
    pub port: u16,
    #[serde(default)]
    pub path: Option<Arc<str>>,
    #[serde(default)]
    pub common_name: Option<Arc<str>>,
    #[serde(default = "default_timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    /// Optional HTTP proxy URL for the DoH client (§4.2: "optional HTTP
    /// proxy"). Ignored by the UDP/TCP and DoT clients.
    #[serde(default)]
    pub proxy: Option<Arc<str>>,
}

fn default_timeout_ms() -> Duration {
    Duration::from_millis(2000)
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

impl Upstream {
    pub fn is_encrypted(&self) -> bool {
        matches!(self.protocol, UpstreamProtocol::Tls | UpstreamProtocol::Https)
    }

    pub fn sni_name(&self) -> Arc<str> {
        self.common_name.clone().unwrap_or_else(|| self.host.clone())
    }
}

/// Dispatch strategy for a group of upstreams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStrategy {
    ParallelBest,
    Random,
    Strict,
}

/// How a group verifies its upstreams at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InitStrategy {
    Blocking,
    FailOnError,
    Fast,
}

impl Default for InitStrategy {
    fn default() -> Self {
        InitStrategy::Blocking
    }
}

/// `{Name, Strategy, Upstreams[], Timeout, InitStrategy}`.
///
/// Invariant: a group named `default` exists and is non-empty; enforced at
/// config-validation time, not by this type.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamGroup {
    pub name: Arc<str>,
    pub strategy: UpstreamStrategy,
    pub upstreams: Vec<Upstream>,
    #[serde(default = "default_timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    #[serde(default)]
    pub init_strategy: InitStrategy,
}

pub const DEFAULT_GROUP_NAME: &str = "default";
