//! Special-use domain names stage : RFC 6761 + RFC 6762 names that
//! must never leave this resolver for upstream resolution.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{RecordType, Request, ResolverError, Response, ResponseType};
use tracing::info;

use crate::wire;

/// Exact or suffix matches that resolve to NXDOMAIN, never forwarded.
const NXDOMAIN_NAMES: &[&str] = &["test", "invalid", "local"];

/// RFC 6303 locally-served reverse zones ("sudn-arpa reverse zones" in
///), also answered locally rather than forwarded.
const NXDOMAIN_REVERSE_SUFFIXES: &[&str] = &[
    "10.in-addr.arpa",
    "168.192.in-addr.arpa",
    "254.169.in-addr.arpa",
    "d.f.ip6.arpa",
];

fn is_nxdomain_name(bare: &str) -> bool {
    NXDOMAIN_NAMES.iter().any(|suffix| bare == *suffix || bare.ends_with(&format!(".{suffix}")))
        || NXDOMAIN_REVERSE_SUFFIXES
            .iter()
            .any(|suffix| bare == *suffix || bare.ends_with(&format!(".{suffix}")))
}

pub struct SpecialUseStage {
    next: Arc<dyn ChainStage>,
}

impl SpecialUseStage {
    pub fn new(next: Arc<dyn ChainStage>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl ChainStage for SpecialUseStage {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        let msg = wire::parse(&request.wire)?;
        let Some((name, record_type)) = wire::question(&msg) else {
            return self.next.resolve(request).await;
        };
        let qname = name.to_utf8().to_ascii_lowercase();
        let bare = qname.trim_end_matches('.');

        if bare == "localhost" {
            let built = match record_type {
                RecordType::A => wire::build_a_record(&msg, &name, Ipv4Addr::LOCALHOST, 3600),
                RecordType::AAAA => wire::build_aaaa_record(&msg, &name, Ipv6Addr::LOCALHOST, 3600),
                _ => wire::build_empty_noerror(&msg),
            };
            return Ok(Response::new(wire::to_bytes(&built)?, ResponseType::Special, "SPECIAL (localhost)"));
        }

        if is_nxdomain_name(bare) {
            let nxdomain = wire::build_nxdomain(&msg);
            return Ok(Response::new(wire::to_bytes(&nxdomain)?, ResponseType::Special, "SPECIAL (reserved)"));
        }

        self.next.resolve(request).await
    }

    fn stage_type(&self) -> &'static str {
        "special_use"
    }

    fn log_config(&self) {
        info!("special-use domain stage configured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::{ClientProtocol, LogContext};
    use hickory_proto::op::{Message, MessageType, OpCode, Query};
    use hickory_proto::rr::{DNSClass, Name, RecordType as HickoryRecordType};
    use std::net::IpAddr;
    use std::time::SystemTime;

    struct Unreachable;
    #[async_trait]
    impl ChainStage for Unreachable {
        async fn resolve(&self, _request: &Request) -> Result<Response, ResolverError> {
            panic!("must not delegate for a special-use name")
        }
        fn stage_type(&self) -> &'static str {
            "unreachable"
        }
    }

    fn request_for(qname: &str, record_type: HickoryRecordType) -> Request {
        let mut query = Query::new();
        query.set_name(Name::from_ascii(qname).unwrap());
        query.set_query_type(record_type);
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

    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn localhost_resolves_to_loopback() {
        let stage = SpecialUseStage::new(Arc::new(Unreachable));
        let resp = stage.resolve(&request_for("localhost.", HickoryRecordType::A)).await.unwrap();
        assert_eq!(resp.response_type, ResponseType::Special);
        let msg = wire::parse(&resp.wire).unwrap();
        let (ips, _) = wire::answer_ips_and_cnames(&msg);
        assert_eq!(ips, vec!["127.0.0.1".to_string()]);
    }

    #[tokio::test]
    async fn test_tld_is_nxdomain() {
        let stage = SpecialUseStage::new(Arc::new(Unreachable));
        let resp = stage.resolve(&request_for("foo.test.", HickoryRecordType::A)).await.unwrap();
        assert_eq!(resp.response_type, ResponseType::Special);
        let msg = wire::parse(&resp.wire).unwrap();
        assert!(wire::is_nxdomain(&msg));
    }
}
