//! ECS stage : EDNS Client-Subnet handling on ingress (`UseAsClient`)
//! and egress (`Forward`).

use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{EcsConfig, Request, ResolverError, Response};
use tracing::info;

use crate::wire;

pub struct EcsStage {
    config: EcsConfig,
    next: Arc<dyn ChainStage>,
}

impl EcsStage {
    pub fn new(config: EcsConfig, next: Arc<dyn ChainStage>) -> Self {
        Self { config, next }
    }
}

#[async_trait]
impl ChainStage for EcsStage {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        if !self.config.enabled() {
            return self.next.resolve(request).await;
        }

        let mut msg = wire::parse(&request.wire)?;
        let mut effective_ip = request.client_ip;

        if self.config.use_as_client {
            if let Some((address, source_prefix)) = wire::ecs_option(&msg) {
                if !wire::ecs_is_multi_client(address, source_prefix) {
                    effective_ip = address;
                }
            }
        }

        if self.config.forward {
            wire::inject_ecs(&mut msg, effective_ip, self.config.ipv4_mask, self.config.ipv6_mask);
        }

        if effective_ip == request.client_ip && !self.config.forward {
            return self.next.resolve(request).await;
        }

        let wire_bytes = wire::to_bytes(&msg)?;
        let mut enriched = request.with_wire(wire_bytes);
        enriched.client_ip = effective_ip;
        self.next.resolve(&enriched).await
    }

    fn stage_type(&self) -> &'static str {
        "ecs"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled()
    }

    fn log_config(&self) {
        info!(
            use_as_client = self.config.use_as_client,
            forward = self.config.forward,
            ipv4_mask = self.config.ipv4_mask,
            ipv6_mask = self.config.ipv6_mask,
            "ecs stage configured"
        );
    }
}
