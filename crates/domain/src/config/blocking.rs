use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::block_handler::BlockHandler;

/// `Blocking.*` configuration surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockingConfig {
    /// `ZEROIP` | `NXDOMAIN` | comma-separated IPs. Parsed with
    /// [`BlockHandler::parse`] at wiring time.
    #[serde(default = "default_block_type")]
    pub block_type: String,

    /// `group -> [sources]`. A source is a file path or `http(s)://` URL
    /// consumed by the infrastructure layer's list compiler.
    #[serde(default)]
    pub black_lists: HashMap<String, Vec<String>>,

    /// `group -> [sources]`.
    #[serde(default)]
    pub white_lists: HashMap<String, Vec<String>>,

    /// `clientSelector -> [groupTag]`. Selector is a name-glob, IP literal,
    /// or CIDR, parsed via [`crate::selector::ClientSelector`].
    #[serde(default)]
    pub client_groups_block: HashMap<String, Vec<String>>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_block_type() -> String {
    "ZEROIP".into()
}

fn default_true() -> bool {
    true
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            block_type: default_block_type(),
            black_lists: HashMap::new(),
            white_lists: HashMap::new(),
            client_groups_block: HashMap::new(),
            enabled: true,
        }
    }
}

impl BlockingConfig {
    pub fn block_handler(&self) -> BlockHandler {
        BlockHandler::parse(&self.block_type)
    }

    /// Groups that carry only a whitelist and no blacklist: for these, a
    /// whitelist miss is not itself a block, since there's no blacklist to
    /// fall back to.
    pub fn whitelist_only_groups(&self) -> Vec<String> {
        self.white_lists
            .keys()
            .filter(|g| !self.black_lists.contains_key(*g))
            .cloned()
            .collect()
    }
}
