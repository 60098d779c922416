use crate::errors::ResolverError;
use crate::selector::SelectorEntry;
use crate::upstream::{UpstreamGroup, DEFAULT_GROUP_NAME};
use serde::{Deserialize, Serialize};

/// `Upstreams.*` configuration surface.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpstreamsConfig {
    #[serde(default)]
    pub groups: Vec<UpstreamGroup>,

    /// `clientSelector -> groupName` routing table consumed by the
    /// UpstreamTree: each entry's "group key" is an IP literal, client-name
    /// glob, or CIDR, resolved in that priority order, falling back to
    /// `default` when nothing matches.
    #[serde(default)]
    pub routing: Vec<SelectorEntry>,
}

impl UpstreamsConfig {
    /// Requires a group named `default` to exist and be non-empty, since the
    /// routing table falls back to it whenever no selector matches.
    pub fn validate(&self) -> Result<(), ResolverError> {
        let default = self
            .groups
            .iter()
            .find(|g| g.name.as_ref() == DEFAULT_GROUP_NAME);
        match default {
            Some(g) if !g.upstreams.is_empty() => Ok(()),
            _ => Err(ResolverError::MissingDefaultGroup),
        }
    }
}
