//! Rewriter stage (property 7): rewrites the parent suffix of the
//! leaf question name per a configured `suffix -> suffix` map, resolves the
//! rewritten request, then restores the original question/answer names so
//! the rewrite is invisible end-to-end.
//!
//! Expressed per's offered alternative ("let the wrapper invoke both
//! branches by calling them directly") rather than a separate nested
//! resolver tree: `next` plays both roles — first invoked with the
//! rewritten request as the "inner" resolve, then, only if that returns the
//! no-response sentinel and a fallback is configured, invoked again with the
//! original request as the "outer" fall-through.

use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{Request, ResolverError, Response, RewriteConfig};
use hickory_proto::rr::Name;
use tracing::info;

use crate::wire;

pub struct RewriterStage {
    mapping: Vec<(String, String)>,
    fallback_configured: bool,
    next: Arc<dyn ChainStage>,
}

impl RewriterStage {
    pub fn new(config: &RewriteConfig, next: Arc<dyn ChainStage>) -> Self {
        let mapping: Vec<(String, String)> = config
            .mapping
            .iter()
            .map(|(from, to)| (from.trim_end_matches('.').to_ascii_lowercase(), to.trim_end_matches('.').to_ascii_lowercase()))
            .collect();
        Self {
            mapping,
            fallback_configured: config.fallback_upstream.is_some(),
            next,
        }
    }

    /// Finds the configured rule whose `from` suffix matches `bare` and
    /// returns the rewritten name, preserving any leaf labels in front of
    /// the matched suffix.
    fn rewrite(&self, bare: &str) -> Option<String> {
        for (from, to) in &self.mapping {
            if bare == from {
                return Some(to.clone());
            }
            if let Some(prefix) = bare.strip_suffix(&format!(".{from}")) {
                return Some(format!("{prefix}.{to}"));
            }
        }
        None
    }
}

#[async_trait]
impl ChainStage for RewriterStage {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        if self.mapping.is_empty() {
            return self.next.resolve(request).await;
        }

        let original_msg = wire::parse(&request.wire)?;
        let Some((original_name, _)) = wire::question(&original_msg) else {
            return self.next.resolve(request).await;
        };
        let qname = original_name.to_utf8().to_ascii_lowercase();
        let bare = qname.trim_end_matches('.');

        let Some(rewritten_name) = self.rewrite(bare) else {
            return self.next.resolve(request).await;
        };

        let rewritten_fqdn = format!("{rewritten_name}.");
        let Ok(new_name) = Name::from_ascii(&rewritten_fqdn) else {
            return self.next.resolve(request).await;
        };

        let mut rewritten_msg = original_msg.clone();
        wire::rename_question_and_answers(&mut rewritten_msg, &original_name, &new_name);
        let rewritten_wire = wire::to_bytes(&rewritten_msg)?;
        let rewritten_request = request.with_wire(rewritten_wire);

        let response = self.next.resolve(&rewritten_request).await?;
        if response.is_no_response() {
            if self.fallback_configured {
                return self.next.resolve(request).await;
            }
            return Ok(response);
        }

        let Ok(mut response_msg) = wire::parse(&response.wire) else {
            return Ok(response);
        };
        wire::rename_question_and_answers(&mut response_msg, &new_name, &original_name);
        let Ok(restored_wire) = wire::to_bytes(&response_msg) else {
            return Ok(response);
        };
        Ok(Response::new(restored_wire, response.response_type, response.reason))
    }

    fn stage_type(&self) -> &'static str {
        "rewriter"
    }

    fn is_enabled(&self) -> bool {
        !self.mapping.is_empty()
    }

    fn log_config(&self) {
        info!(rules = self.mapping.len(), "rewriter stage configured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::{ClientProtocol, LogContext, ResponseType};
    use hickory_proto::op::{Message, MessageType, OpCode, Query};
    use hickory_proto::rr::{DNSClass, RecordType as HickoryRecordType};
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::SystemTime;

    struct EchoAnswer;
    #[async_trait]
    impl ChainStage for EchoAnswer {
        async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
            let msg = wire::parse(&request.wire)?;
            let (name, _) = wire::question(&msg).unwrap();
            assert_eq!(name.to_utf8(), "sub.rewritten.");
            let built = wire::build_a_record(&msg, &name, Ipv4Addr::new(1, 2, 3, 4), 300);
            Ok(Response::new(wire::to_bytes(&built)?, ResponseType::Resolved, "RESOLVED"))
        }
        fn stage_type(&self) -> &'static str {
            "echo"
        }
    }

    fn request_for(qname: &str) -> Request {
        let mut query = Query::new();
        query.set_name(Name::from_ascii(qname).unwrap());
        query.set_query_type(HickoryRecordType::A);
        query.set_query_class(DNSClass::IN);
        let mut msg = Message::new(1, MessageType::Query, OpCode::Query);
        msg.add_query(query);
        Request {
            client_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            client_names: vec![],
            client_id: None,
            protocol: ClientProtocol::Udp,
            wire: wire::to_bytes(&msg).unwrap(),
            received_at: SystemTime::now(),
            log: LogContext::default(),
        }
    }

    #[tokio::test]
    async fn round_trip_hides_rewritten_name() {
        let mut mapping = HashMap::new();
        mapping.insert("original".to_string(), "rewritten".to_string());
        let config = RewriteConfig {
            mapping,
            fallback_upstream: None,
        };
        let stage = RewriterStage::new(&config, Arc::new(EchoAnswer));
        let resp = stage.resolve(&request_for("sub.original.")).await.unwrap();
        let msg = wire::parse(&resp.wire).unwrap();
        let (name, _) = wire::question(&msg).unwrap();
        assert_eq!(name.to_utf8(), "sub.original.");
    }
}
