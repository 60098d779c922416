//! FQDN-only stage : a qname with no dot is not a fully-qualified
//! domain name and is answered `NOTFQDN` immediately, without delegating.

use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{Request, ResolverError, Response, ResponseType};
use tracing::info;

use crate::wire;

pub struct FqdnOnlyStage {
    next: Arc<dyn ChainStage>,
}

impl FqdnOnlyStage {
    pub fn new(next: Arc<dyn ChainStage>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl ChainStage for FqdnOnlyStage {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        let msg = wire::parse(&request.wire)?;
        let Some((name, _)) = wire::question(&msg) else {
            return self.next.resolve(request).await;
        };
        let qname = name.to_utf8();
        let bare = qname.trim_end_matches('.');
        if !bare.contains('.') {
            let nxdomain = wire::build_nxdomain(&msg);
            return Ok(Response::new(wire::to_bytes(&nxdomain)?, ResponseType::NotFqdn, "NOTFQDN"));
        }
        self.next.resolve(request).await
    }

    fn stage_type(&self) -> &'static str {
        "fqdn_only"
    }

    fn log_config(&self) {
        info!("fqdn-only stage configured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::{ClientProtocol, LogContext};
    use hickory_proto::op::{Message, MessageType, OpCode, Query};
    use hickory_proto::rr::{DNSClass, Name, RecordType as HickoryRecordType};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::SystemTime;

    struct Unreachable;
    #[async_trait]
    impl ChainStage for Unreachable {
        async fn resolve(&self, _request: &Request) -> Result<Response, ResolverError> {
            panic!("must not delegate for a non-FQDN name")
        }
        fn stage_type(&self) -> &'static str {
            "unreachable"
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
    async fn bare_label_is_not_fqdn() {
        let stage = FqdnOnlyStage::new(Arc::new(Unreachable));
        let resp = stage.resolve(&request_for("router")).await.unwrap();
        assert_eq!(resp.response_type, ResponseType::NotFqdn);
    }
}
