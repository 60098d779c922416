//! The chain's innermost stage : routes a request through
//! [`UpstreamTree`] to the right [`GroupRegistry`] entry, dispatches to the
//! group, and turns the raw upstream reply into a [`Response`]. There is no
//! `next` here — an unresolvable query becomes a SERVFAIL, not a delegate.

use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{Request, ResolverError, Response, ResponseType};
use tracing::{info, warn};

use super::registry::GroupRegistry;
use crate::upstream_tree::UpstreamTree;
use crate::wire;

pub struct DispatchStage {
    tree: Arc<UpstreamTree>,
    registry: Arc<GroupRegistry>,
}

impl DispatchStage {
    pub fn new(tree: Arc<UpstreamTree>, registry: Arc<GroupRegistry>) -> Self {
        Self { tree, registry }
    }
}

#[async_trait]
impl ChainStage for DispatchStage {
    /// Propagates an `Err` rather than synthesizing SERVFAIL itself: per,
    /// turning an unrecoverable chain error into Rcode=SERVFAIL is the
    /// top-level handler's job, not any one stage's.
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        let group_name = self.tree.route(request);
        let Some(dispatcher) = self.registry.get(&group_name) else {
            warn!(group = %group_name, "routed to unknown upstream group");
            return Err(ResolverError::Config(format!(
                "no such upstream group '{group_name}'"
            )));
        };

        let reply = dispatcher.dispatch(&request.wire, request.protocol).await?;

 // "Protocol" error: an upstream SERVFAIL/REFUSED is a well-formed
        // wire message, not a transport failure — relay it to the client
        // rather than synthesizing our own SERVFAIL.
        if let Ok(msg) = wire::parse(&reply.wire) {
            if wire::is_server_error(&msg) {
                return Ok(Response::new(reply.wire, ResponseType::Resolved, "upstream server error"));
            }
        }
        Ok(Response::new(reply.wire, ResponseType::Resolved, "resolved"))
    }

    fn stage_type(&self) -> &'static str {
        "dispatch"
    }

    fn log_config(&self) {
        info!("dispatch stage configured");
    }
}
