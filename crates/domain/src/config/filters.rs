use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `Filters.*` configuration surface for the small stages. Not its own
/// top-level key in's configuration table, but every knob here is named
/// explicitly in's prose (`UseAsClient`, `Forward`, `IPv4Mask`/
/// `IPv6Mask`, the conditional domain map, the rewrite map,
/// `FallbackUpstream`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub ecs: EcsConfig,

    #[serde(default = "default_true")]
    pub ipv6_disabling: bool,

    #[serde(default = "default_true")]
    pub extended_error_code: bool,

    #[serde(default)]
    pub conditional: ConditionalConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,
}

fn default_true() -> bool {
    true
}

/// EDNS Client-Subnet handling (ECS).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EcsConfig {
    /// If the incoming request carries a host-masked ECS option, overwrite
    /// `request.client_ip` with it before routing/blocking decisions.
    #[serde(default)]
    pub use_as_client: bool,

    /// Inject an ECS option derived from `request.client_ip` before
    /// forwarding upstream.
    #[serde(default)]
    pub forward: bool,

    #[serde(default = "default_v4_mask")]
    pub ipv4_mask: u8,

    #[serde(default = "default_v6_mask")]
    pub ipv6_mask: u8,
}

fn default_v4_mask() -> u8 {
    24
}

fn default_v6_mask() -> u8 {
    56
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            use_as_client: false,
            forward: false,
            ipv4_mask: default_v4_mask(),
            ipv6_mask: default_v6_mask(),
        }
    }
}

impl EcsConfig {
    pub fn enabled(&self) -> bool {
        self.use_as_client || self.forward
    }
}

/// `domain suffix -> upstream group name` conditional forwarding map (
/// Conditional).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConditionalConfig {
    #[serde(default)]
    pub mapping: HashMap<String, String>,
}

/// `suffix -> suffix` rewrite map plus an optional fallback upstream group
/// name (Rewriter).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RewriteConfig {
    #[serde(default)]
    pub mapping: HashMap<String, String>,

    #[serde(default)]
    pub fallback_upstream: Option<String>,
}
