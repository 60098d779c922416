//! Resolves which blocklist group tags apply to a request's client, from
//! `Blocking.ClientGroupsBlock` (`clientSelector -> [groupTag]`).
//!
//! Structured like [`crate::upstream_tree::UpstreamTree`] but selects a list
//! of group tags rather than a single upstream target. open question (a)
//! settles the ambiguity between a literal "union of all matching
//! selectors" reading and the priority-based resolution used elsewhere for
//! routing selectors: this picks the single highest-priority matching
//! selector's group list, for consistency with upstream routing (see
//! DESIGN.md).

use std::sync::Arc;

use arc_swap::ArcSwap;
use ferrous_resolver_domain::{ClientSelector, Request, ResolverError};
use tracing::warn;

struct SelectorEntry {
    selector: ClientSelector,
    groups: Vec<Arc<str>>,
}

/// Selects the `groupsToCheck` list for a request, reloadable as a whole.
pub struct ClientGroupSelector {
    entries: ArcSwap<Vec<SelectorEntry>>,
}

impl ClientGroupSelector {
    pub fn new(raw: &std::collections::HashMap<String, Vec<String>>) -> Result<Self, ResolverError> {
        Ok(Self {
            entries: ArcSwap::from_pointee(Self::parse_entries(raw)?),
        })
    }

    pub fn reload(&self, raw: &std::collections::HashMap<String, Vec<String>>) -> Result<(), ResolverError> {
        self.entries.store(Arc::new(Self::parse_entries(raw)?));
        Ok(())
    }

    fn parse_entries(
        raw: &std::collections::HashMap<String, Vec<String>>,
    ) -> Result<Vec<SelectorEntry>, ResolverError> {
        raw.iter()
            .map(|(selector, groups)| {
                Ok(SelectorEntry {
                    selector: ClientSelector::parse(selector)?,
                    groups: groups.iter().map(|g| Arc::from(g.as_str())).collect(),
                })
            })
            .collect()
    }

    /// Priority order: exact IP, then client-name glob, then CIDR
    /// containment. No selector matching yields an empty list (nothing to
    /// check, request proceeds unfiltered).
    pub fn groups_for(&self, request: &Request) -> Vec<Arc<str>> {
        let entries = self.entries.load();

        if let Some(entry) = entries
            .iter()
            .find(|e| matches!(&e.selector, ClientSelector::Ip(ip) if *ip == request.client_ip))
        {
            return entry.groups.clone();
        }

        let name_matches: Vec<&SelectorEntry> = entries
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
                    "multiple client-name group-tag matches, using the first"
                );
            }
            return name_matches[0].groups.clone();
        }

        let cidr_matches: Vec<&SelectorEntry> = entries
            .iter()
            .filter(|e| {
                matches!(&e.selector, ClientSelector::Cidr(_)) && e.selector.matches_ip(request.client_ip)
            })
            .collect();
        if !cidr_matches.is_empty() {
            if cidr_matches.len() > 1 {
                warn!(
                    client_ip = %request.client_ip,
                    candidates = cidr_matches.len(),
                    "multiple CIDR group-tag matches, using the first"
                );
            }
            return cidr_matches[0].groups.clone();
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::{ClientProtocol, LogContext, Request};
    use std::collections::HashMap;
    use std::net::Ipv4Addr;
    use std::time::SystemTime;

    fn request(ip: IpAddr) -> Request {
        Request {
            client_ip: ip,
            client_names: vec![],
            client_id: None,
            protocol: ClientProtocol::Udp,
            wire: Arc::from(Vec::<u8>::new().into_boxed_slice()),
            received_at: SystemTime::now(),
            log: LogContext::default(),
        }
    }

    #[test]
    fn exact_ip_selects_groups() {
        let mut raw = HashMap::new();
        raw.insert("192.168.1.5".to_string(), vec!["kids".to_string()]);
        let selector = ClientGroupSelector::new(&raw).unwrap();
        let req = request(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 5)));
        assert_eq!(selector.groups_for(&req), vec![Arc::<str>::from("kids")]);
    }

    #[test]
    fn no_match_yields_empty() {
        let selector = ClientGroupSelector::new(&HashMap::new()).unwrap();
        let req = request(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(selector.groups_for(&req).is_empty());
    }
}
