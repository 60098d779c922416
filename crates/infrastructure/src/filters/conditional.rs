//! Conditional-forwarding stage : routes specific domain suffixes
//! straight to a named upstream group, bypassing the normal
//! [`crate::upstream_tree::UpstreamTree`] routing and tagging the response
//! `CONDITIONAL`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{ConditionalConfig, Request, ResolverError, Response, ResponseType};
use tracing::info;

use crate::dispatch::GroupRegistry;
use crate::wire;

pub struct ConditionalStage {
    mapping: HashMap<String, Arc<str>>,
    registry: Arc<GroupRegistry>,
    next: Arc<dyn ChainStage>,
}

impl ConditionalStage {
    pub fn new(config: &ConditionalConfig, registry: Arc<GroupRegistry>, next: Arc<dyn ChainStage>) -> Self {
        let mapping = config
            .mapping
            .iter()
            .map(|(suffix, group)| (suffix.trim_end_matches('.').to_ascii_lowercase(), Arc::from(group.as_str())))
            .collect();
        Self {
            mapping,
            registry,
            next,
        }
    }

    /// Walks parent labels of `qname` (full name, then each suffix after
    /// stripping the leftmost label, finally `.`) looking for a configured
    /// target group ("walking parent labels, falling back to `.`").
    fn target_group(&self, qname: &str) -> Option<Arc<str>> {
        if let Some(group) = self.mapping.get(".") {
            if self.mapping.len() == 1 {
                return Some(group.clone());
            }
        }
        let mut rest = qname;
        loop {
            if let Some(group) = self.mapping.get(rest) {
                return Some(group.clone());
            }
            match rest.split_once('.') {
                Some((_, tail)) if !tail.is_empty() => rest = tail,
                _ => break,
            }
        }
        self.mapping.get(".").cloned()
    }
}

#[async_trait]
impl ChainStage for ConditionalStage {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        if self.mapping.is_empty() {
            return self.next.resolve(request).await;
        }
        let msg = wire::parse(&request.wire)?;
        let Some((name, _)) = wire::question(&msg) else {
            return self.next.resolve(request).await;
        };
        let qname = name.to_utf8().to_ascii_lowercase();
        let bare = qname.trim_end_matches('.');

        let Some(group_name) = self.target_group(bare) else {
            return self.next.resolve(request).await;
        };
        let Some(dispatcher) = self.registry.get(&group_name) else {
            return self.next.resolve(request).await;
        };

        let reply = dispatcher.dispatch(&request.wire, request.protocol).await?;
        Ok(Response::new(reply.wire, ResponseType::Conditional, format!("CONDITIONAL ({group_name})")))
    }

    fn stage_type(&self) -> &'static str {
        "conditional"
    }

    fn is_enabled(&self) -> bool {
        !self.mapping.is_empty()
    }

    fn log_config(&self) {
        info!(domains = self.mapping.len(), "conditional forwarding stage configured");
    }
}
