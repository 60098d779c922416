//! Routes a request to the right upstream group by client IP, name, or CIDR
//!. Stored behind an [`arc_swap::ArcSwap`] so hot-reconfiguration can
//! swap the whole routing table without a lock on the read path.

use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use ferrous_resolver_domain::{ClientSelector, Request, ResolverError, SelectorEntry, DEFAULT_GROUP_NAME};
use tracing::warn;

/// One routing rule, selector pre-parsed at load time so the hot path never
/// re-parses a selector string.
struct RoutingEntry {
    selector: ClientSelector,
    target: Arc<str>,
}

pub struct UpstreamTree {
    entries: ArcSwap<Vec<RoutingEntry>>,
}

impl UpstreamTree {
    pub fn new(entries: Vec<SelectorEntry>) -> Result<Self, ResolverError> {
        Ok(Self {
            entries: ArcSwap::from_pointee(Self::parse_entries(entries)?),
        })
    }

    pub fn reload(&self, entries: Vec<SelectorEntry>) -> Result<(), ResolverError> {
        self.entries.store(Arc::new(Self::parse_entries(entries)?));
        Ok(())
    }

    fn parse_entries(entries: Vec<SelectorEntry>) -> Result<Vec<RoutingEntry>, ResolverError> {
        entries
            .into_iter()
            .map(|e| {
                Ok(RoutingEntry {
                    selector: ClientSelector::parse(&e.selector)?,
                    target: e.target,
                })
            })
            .collect()
    }

    /// Priority order (open question a): exact IP, then client-name
    /// glob, then CIDR containment, then `default`. Multiple matches at the
    /// name/CIDR steps keep the first (stable iteration) and log a warning.
    pub fn route(&self, request: &Request) -> Arc<str> {
        let entries = self.entries.load();

        if let Some(entry) = entries
            .iter()
            .find(|e| matches!(&e.selector, ClientSelector::Ip(ip) if *ip == request.client_ip))
        {
            return entry.target.clone();
        }

        let name_matches: Vec<&RoutingEntry> = entries
            .iter()
            .filter(|e| {
                matches!(&e.selector, ClientSelector::Name(_))
                    && request.client_names.iter().any(|n| e.selector.matches_name(n))
            })
            .collect();
        if !name_matches.is_empty() {
            if name_matches.len() > 1 {
                warn!(
                    client_ip = %request.client_ip,
                    candidates = name_matches.len(),
                    "multiple client-name group matches, using the first"
                );
            }
            return name_matches[0].target.clone();
        }

        let cidr_matches: Vec<&RoutingEntry> = entries
            .iter()
            .filter(|e| {
                matches!(&e.selector, ClientSelector::Cidr(_))
                    && e.selector.matches_ip(request.client_ip)
            })
            .collect();
        if !cidr_matches.is_empty() {
            if cidr_matches.len() > 1 {
                warn!(
                    client_ip = %request.client_ip,
                    candidates = cidr_matches.len(),
                    "multiple CIDR group matches, using the first"
                );
            }
            return cidr_matches[0].target.clone();
        }

        Arc::from(DEFAULT_GROUP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::{ClientProtocol, LogContext, Request};
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::time::SystemTime;

    fn request(ip: IpAddr, names: Vec<&str>) -> Request {
        Request {
            client_ip: ip,
            client_names: names.into_iter().map(Arc::from).collect(),
            client_id: None,
            protocol: ClientProtocol::Udp,
            wire: Arc::from(Vec::<u8>::new().into_boxed_slice()),
            received_at: SystemTime::now(),
            log: LogContext::default(),
        }
    }

    #[test]
    fn exact_ip_beats_everything() {
        let tree = UpstreamTree::new(vec![
            SelectorEntry {
                selector: Arc::from("192.168.1.5"),
                target: Arc::from("kids"),
            },
            SelectorEntry {
                selector: Arc::from("192.168.1.0/24"),
                target: Arc::from("lan"),
            },
        ])
        .unwrap();
        let req = request(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5)), vec![]);
        assert_eq!(&*tree.route(&req), "kids");
    }

    #[test]
    fn falls_back_to_default() {
        let tree = UpstreamTree::new(vec![]).unwrap();
        let req = request(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), vec![]);
        assert_eq!(&*tree.route(&req), DEFAULT_GROUP_NAME);
    }

    #[test]
    fn cidr_containment_matches() {
        let tree = UpstreamTree::new(vec![SelectorEntry {
            selector: Arc::from("10.0.0.0/8"),
            target: Arc::from("lan"),
        }])
        .unwrap();
        let req = request(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)), vec![]);
        assert_eq!(&*tree.route(&req), "lan");
    }
}
