//! Extended DNS Error stage (RFC 8914): after delegation, maps the
//! returned [`ResponseType`] to an EDE info-code and attaches it as an EDNS0
//! option. The outermost stage in the chain, since it needs to observe the
//! final response type after every inner stage has had its say.

use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{Request, ResolverError, Response};
use tracing::info;

use crate::wire;

pub struct EdeStage {
    enabled: bool,
    next: Arc<dyn ChainStage>,
}

impl EdeStage {
    pub fn new(enabled: bool, next: Arc<dyn ChainStage>) -> Self {
        Self { enabled, next }
    }
}

#[async_trait]
impl ChainStage for EdeStage {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        let response = self.next.resolve(request).await?;
        if !self.enabled || response.is_no_response() {
            return Ok(response);
        }
        let Some(info_code) = response.response_type.extended_error_code() else {
            return Ok(response);
        };

        let Ok(mut msg) = wire::parse(&response.wire) else {
            return Ok(response);
        };
        wire::attach_ede(&mut msg, info_code, &response.reason);
        let Ok(wire_bytes) = wire::to_bytes(&msg) else {
            return Ok(response);
        };
        Ok(Response::new(wire_bytes, response.response_type, response.reason))
    }

    fn stage_type(&self) -> &'static str {
        "ede"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn log_config(&self) {
        info!(enabled = self.enabled, "extended-dns-error stage configured");
    }
}
