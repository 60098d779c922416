//! `BlockingResolver` : evaluates a question, and later its answer IPs
//! and CNAMEs, against per-group blacklists/whitelists, gated by a runtime
//! enable/disable state.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ferrous_resolver_application::ports::{ChainStage, ListMatcher};
use ferrous_resolver_domain::{
    BlockHandler, BlockingState, Request, ResolverError, Response, ResponseType, BLOCK_RESPONSE_TTL_SECS,
};
use tokio::task::JoinHandle;
use tracing::info;

use super::client_groups::ClientGroupSelector;
use crate::metrics::ChainMetrics;
use crate::wire;

/// Evaluates blacklists/whitelists before and after delegation.
pub struct BlockingResolver {
    state: Mutex<BlockingState>,
    reenable_timer: Mutex<Option<JoinHandle<()>>>,
    whitelist: Arc<dyn ListMatcher>,
    blacklist: Arc<dyn ListMatcher>,
    client_groups: ClientGroupSelector,
    whitelist_only_groups: BTreeSet<Arc<str>>,
    block_handler: BlockHandler,
    metrics: Arc<ChainMetrics>,
    next: Arc<dyn ChainStage>,
}

impl BlockingResolver {
    pub fn new(
        whitelist: Arc<dyn ListMatcher>,
        blacklist: Arc<dyn ListMatcher>,
        client_groups: ClientGroupSelector,
        whitelist_only_groups: impl IntoIterator<Item = Arc<str>>,
        block_handler: BlockHandler,
        next: Arc<dyn ChainStage>,
    ) -> Self {
        Self::with_metrics(
            whitelist,
            blacklist,
            client_groups,
            whitelist_only_groups,
            block_handler,
            Arc::new(ChainMetrics::default()),
            next,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_metrics(
        whitelist: Arc<dyn ListMatcher>,
        blacklist: Arc<dyn ListMatcher>,
        client_groups: ClientGroupSelector,
        whitelist_only_groups: impl IntoIterator<Item = Arc<str>>,
        block_handler: BlockHandler,
        metrics: Arc<ChainMetrics>,
        next: Arc<dyn ChainStage>,
    ) -> Self {
        Self {
            state: Mutex::new(BlockingState::default()),
            reenable_timer: Mutex::new(None),
            whitelist,
            blacklist,
            client_groups,
            whitelist_only_groups: whitelist_only_groups.into_iter().collect(),
            block_handler,
            metrics,
            next,
        }
    }

    /// Disables the groups named in `groups` (all groups if empty) for
    /// `duration` (zero means "forever until re-enabled"). A new call cancels
    /// any prior timer, per the state machine.
    pub fn disable(self: &Arc<Self>, duration: Duration, groups: impl IntoIterator<Item = Arc<str>>) {
        let groups: Vec<Arc<str>> = groups.into_iter().collect();
        {
            let mut state = self.state.lock().expect("blocking state poisoned");
            state.disable(duration, groups);
        }

        let mut timer = self.reenable_timer.lock().expect("blocking timer poisoned");
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        if !duration.is_zero() {
            let this = Arc::clone(self);
            *timer = Some(tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                this.enable();
            }));
        }
    }

    pub fn enable(&self) {
        self.state.lock().expect("blocking state poisoned").enable();
        if let Some(handle) = self.reenable_timer.lock().expect("blocking timer poisoned").take() {
            handle.abort();
        }
    }

    fn groups_to_check(&self, request: &Request) -> BTreeSet<Arc<str>> {
        let selected: BTreeSet<Arc<str>> = self.client_groups.groups_for(request).into_iter().collect();
        let state = self.state.lock().expect("blocking state poisoned");
        state.active_groups(&selected)
    }

    /// Returns the block reason if `fqdn` should be blocked for `groups`,
    /// per the whitelist-then-blacklist order.
    fn check(&self, groups: &[Arc<str>], fqdn: &str) -> Option<Arc<str>> {
        if self.whitelist.matches(fqdn, groups).is_some() {
            return None;
        }
        if !groups.is_empty() && self.is_whitelist_only(groups) {
            return Some(Arc::from("BLOCKED (WHITELIST ONLY)"));
        }
        self.blacklist
            .matches(fqdn, groups)
            .map(|group| Arc::from(format!("BLOCKED ({group})")))
    }

    fn is_whitelist_only(&self, groups: &[Arc<str>]) -> bool {
        !groups.is_empty() && groups.iter().all(|g| self.whitelist_only_groups.contains(g))
    }

    fn build_block_response(
        &self,
        request_msg: &hickory_proto::op::Message,
        reason: Arc<str>,
    ) -> Result<Response, ResolverError> {
        let Some((name, record_type)) = wire::question(request_msg) else {
            let msg = wire::build_nxdomain(request_msg);
            return Ok(Response::new(wire::to_bytes(&msg)?, ResponseType::Blocked, reason));
        };

        let msg = match &self.block_handler {
            BlockHandler::NxDomain => wire::build_nxdomain(request_msg),
            BlockHandler::ZeroIp => self.zeroip_or_nxdomain(request_msg, &name, record_type),
            BlockHandler::IpList(ips) => self.ip_list_response(request_msg, &name, record_type, ips),
        };
        Ok(Response::new(wire::to_bytes(&msg)?, ResponseType::Blocked, reason))
    }

    fn zeroip_or_nxdomain(
        &self,
        request: &hickory_proto::op::Message,
        name: &hickory_proto::rr::Name,
        record_type: ferrous_resolver_domain::RecordType,
    ) -> hickory_proto::op::Message {
        match record_type {
            ferrous_resolver_domain::RecordType::A => {
                wire::build_a_record(request, name, Ipv4Addr::UNSPECIFIED, BLOCK_RESPONSE_TTL_SECS)
            }
            ferrous_resolver_domain::RecordType::AAAA => {
                wire::build_aaaa_record(request, name, Ipv6Addr::UNSPECIFIED, BLOCK_RESPONSE_TTL_SECS)
            }
            _ => wire::build_nxdomain(request),
        }
    }

    fn ip_list_response(
        &self,
        request: &hickory_proto::op::Message,
        name: &hickory_proto::rr::Name,
        record_type: ferrous_resolver_domain::RecordType,
        ips: &[IpAddr],
    ) -> hickory_proto::op::Message {
        match record_type {
            ferrous_resolver_domain::RecordType::A => {
                match ips.iter().find_map(|ip| match ip {
                    IpAddr::V4(v4) => Some(*v4),
                    IpAddr::V6(_) => None,
                }) {
                    Some(ip) => wire::build_a_record(request, name, ip, BLOCK_RESPONSE_TTL_SECS),
                    None => self.zeroip_or_nxdomain(request, name, record_type),
                }
            }
            ferrous_resolver_domain::RecordType::AAAA => {
                match ips.iter().find_map(|ip| match ip {
                    IpAddr::V6(v6) => Some(*v6),
                    IpAddr::V4(_) => None,
                }) {
                    Some(ip) => wire::build_aaaa_record(request, name, ip, BLOCK_RESPONSE_TTL_SECS),
                    None => self.zeroip_or_nxdomain(request, name, record_type),
                }
            }
            _ => wire::build_nxdomain(request),
        }
    }
}

#[async_trait]
impl ChainStage for BlockingResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        let groups: Vec<Arc<str>> = self.groups_to_check(request).into_iter().collect();
        if groups.is_empty() {
            return self.next.resolve(request).await;
        }

        let request_msg = wire::parse(&request.wire)?;
        let Some(qname) = wire::question_name_lower(&request_msg) else {
            return self.next.resolve(request).await;
        };

        if let Some(reason) = self.check(&groups, &qname) {
            self.metrics.blocking.record_blocked();
            return self.build_block_response(&request_msg, reason);
        }
        self.metrics.blocking.record_allowed();

        let response = self.next.resolve(request).await?;
        if response.is_no_response() || response.response_type == ResponseType::Blocked {
            return Ok(response);
        }

        let Ok(response_msg) = wire::parse(&response.wire) else {
            return Ok(response);
        };
        let (ips, cnames) = wire::answer_ips_and_cnames(&response_msg);
        for candidate in ips.iter().chain(cnames.iter()) {
            let lowered = candidate.to_ascii_lowercase();
            if self.whitelist.matches(&lowered, &groups).is_some() {
                continue;
            }
            if let Some(group) = self.blacklist.matches(&lowered, &groups) {
                self.metrics.blocking.record_blocked();
                return self.build_block_response(&request_msg, Arc::from(format!("BLOCKED ({group})")));
            }
        }

        Ok(response)
    }

    fn stage_type(&self) -> &'static str {
        "blocking"
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().expect("blocking state poisoned").enabled
    }

    fn log_config(&self) {
        info!(block_handler = ?self.block_handler, "blocking stage configured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::list_matcher::DomainListMatcher;
    use ferrous_resolver_domain::{ClientProtocol, LogContext, ResponseType};
    use hickory_proto::op::{Message, MessageType, OpCode, Query};
    use hickory_proto::rr::{DNSClass, Name, RecordType as HickoryRecordType};
    use std::collections::HashMap;
    use std::net::Ipv4Addr;
    use std::time::SystemTime;

    struct NextAllows;

    #[async_trait]
    impl ChainStage for NextAllows {
        async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
            let msg = wire::parse(&request.wire)?;
            let (name, _) = wire::question(&msg).unwrap();
            let built = wire::build_a_record(&msg, &name, Ipv4Addr::new(93, 184, 216, 34), 300);
            Ok(Response::new(wire::to_bytes(&built)?, ResponseType::Resolved, "RESOLVED"))
        }
        fn stage_type(&self) -> &'static str {
            "test-next"
        }
    }

    fn query_request(qname: &str, client_ip: IpAddr) -> Request {
        let mut query = Query::new();
        query.set_name(Name::from_ascii(qname).unwrap());
        query.set_query_type(HickoryRecordType::A);
        query.set_query_class(DNSClass::IN);
        let mut msg = Message::new(1, MessageType::Query, OpCode::Query);
        msg.add_query(query);
        let wire = wire::to_bytes(&msg).unwrap();
        Request {
            client_ip,
            client_names: vec![],
            client_id: None,
            protocol: ClientProtocol::Udp,
            wire,
            received_at: SystemTime::now(),
            log: LogContext::default(),
        }
    }

    fn make_resolver(blacklist_group: &str, blacklist_domain: &str, client_ip: &str) -> BlockingResolver {
        let mut black = HashMap::new();
        black.insert(blacklist_group.to_string(), vec![blacklist_domain.to_string()]);
        let blacklist = Arc::new(DomainListMatcher::new(&black));
        let whitelist = Arc::new(DomainListMatcher::new(&HashMap::new()));

        let mut groups = HashMap::new();
        groups.insert(client_ip.to_string(), vec![blacklist_group.to_string()]);
        let selector = ClientGroupSelector::new(&groups).unwrap();

        BlockingResolver::new(
            whitelist,
            blacklist,
            selector,
            vec![],
            BlockHandler::ZeroIp,
            Arc::new(NextAllows),
        )
    }

    #[tokio::test]
    async fn blocks_matching_domain_with_zeroip() {
        let resolver = make_resolver("kids", "ads.example", "192.168.1.5");
        let req = query_request(
            "foo.ads.example.",
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5)),
        );
        let resp = resolver.resolve(&req).await.unwrap();
        assert_eq!(resp.response_type, ResponseType::Blocked);
        assert!(resp.reason.contains("BLOCKED (kids)"));
        let msg = wire::parse(&resp.wire).unwrap();
        let (ips, _) = wire::answer_ips_and_cnames(&msg);
        assert_eq!(ips, vec!["0.0.0.0".to_string()]);
    }

    #[tokio::test]
    async fn delegates_when_no_group_matches() {
        let resolver = make_resolver("kids", "ads.example", "192.168.1.5");
        let req = query_request("example.com.", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        let resp = resolver.resolve(&req).await.unwrap();
        assert_eq!(resp.response_type, ResponseType::Resolved);
    }

    #[tokio::test]
    async fn disable_stops_blocking_until_reenabled() {
        let resolver = Arc::new(make_resolver("kids", "ads.example", "192.168.1.5"));
        resolver.disable(Duration::ZERO, vec![Arc::from("kids")]);
        let req = query_request(
            "foo.ads.example.",
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5)),
        );
        let resp = resolver.resolve(&req).await.unwrap();
        assert_eq!(resp.response_type, ResponseType::Resolved);

        resolver.enable();
        let resp = resolver.resolve(&req).await.unwrap();
        assert_eq!(resp.response_type, ResponseType::Blocked);
    }
}
