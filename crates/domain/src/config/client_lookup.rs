use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use crate::client_names::StaticClientNameMapping;

/// `ClientLookup.{Upstream, ClientnameIPMapping, SingleNameOrder}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientLookupConfig {
    /// `host:port` of the resolver used for PTR lookups, if any. Without one
    /// configured, the resolver falls back to the raw IP string.
    #[serde(default)]
    pub upstream: Option<String>,

    /// `name -> [ip, ...]` static override, consulted before any PTR query.
    #[serde(default)]
    pub clientname_ip_mapping: HashMap<String, Vec<IpAddr>>,

    /// 1-indexed: pick the Nth PTR result rather than keeping all of them.
    #[serde(default)]
    pub single_name_order: Option<usize>,
}

impl Default for ClientLookupConfig {
    fn default() -> Self {
        Self {
            upstream: None,
            clientname_ip_mapping: HashMap::new(),
            single_name_order: None,
        }
    }
}

impl ClientLookupConfig {
    pub fn static_mapping(&self) -> StaticClientNameMapping {
        let entries = self
            .clientname_ip_mapping
            .iter()
            .map(|(name, ips)| (Arc::from(name.as_str()), ips.clone()))
            .collect();
        StaticClientNameMapping::new(entries)
    }
}
