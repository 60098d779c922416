//! IPv6-disabling stage : answers every AAAA question with an empty
//! NOERROR instead of forwarding, so clients behind this resolver never get
//! routable IPv6 answers.

use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{RecordType, Request, ResolverError, Response, ResponseType};
use tracing::info;

use crate::wire;

pub struct Ipv6DisablingStage {
    enabled: bool,
    next: Arc<dyn ChainStage>,
}

impl Ipv6DisablingStage {
    pub fn new(enabled: bool, next: Arc<dyn ChainStage>) -> Self {
        Self { enabled, next }
    }
}

#[async_trait]
impl ChainStage for Ipv6DisablingStage {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        if !self.enabled {
            return self.next.resolve(request).await;
        }
        let msg = wire::parse(&request.wire)?;
        let Some((_, record_type)) = wire::question(&msg) else {
            return self.next.resolve(request).await;
        };
        if record_type != RecordType::AAAA {
            return self.next.resolve(request).await;
        }
        let empty = wire::build_empty_noerror(&msg);
        Ok(Response::new(wire::to_bytes(&empty)?, ResponseType::Filtered, "IPV6 DISABLED"))
    }

    fn stage_type(&self) -> &'static str {
        "ipv6_disabling"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn log_config(&self) {
        info!(enabled = self.enabled, "ipv6-disabling stage configured");
    }
}
