use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::ResolverError;

/// A client selector key, as used both by [`crate::config::blocking`]'s
/// `ClientGroupsBlock` map and by the upstream tree's routing map (
///). Parsed once at config-load time so the hot path never re-parses.
#[derive(Debug, Clone)]
pub enum ClientSelector {
    /// Exact client-IP match.
    Ip(IpAddr),
    /// Shell-style glob matched against each of `Request::client_names`.
    Name(Arc<str>),
    /// CIDR containment.
    Cidr(IpNetwork),
}

impl ClientSelector {
    /// Parse priority follows: a literal IP is an `Ip` selector, a
    /// string containing `/` is a `Cidr` selector, anything else is a
    /// glob-style `Name` selector.
    pub fn parse(raw: &str) -> Result<Self, ResolverError> {
        if let Ok(ip) = raw.parse::<IpAddr>() {
            return Ok(ClientSelector::Ip(ip));
        }
        if raw.contains('/') {
            let net = IpNetwork::from_str(raw)
                .map_err(|e| ResolverError::InvalidCidr(format!("{raw}: {e}")))?;
            return Ok(ClientSelector::Cidr(net));
        }
        Ok(ClientSelector::Name(Arc::from(raw)))
    }

    pub fn matches_ip(&self, ip: IpAddr) -> bool {
        match self {
            ClientSelector::Ip(selector_ip) => *selector_ip == ip,
            ClientSelector::Cidr(net) => net.contains(ip),
            ClientSelector::Name(_) => false,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            ClientSelector::Name(pattern) => glob_match(pattern, name),
            _ => false,
        }
    }
}

/// Minimal shell-style glob matcher supporting `*` and `?`, sufficient for
/// client-name selectors. Case-insensitive, as DNS names are.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    fn helper(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => helper(&p[1..], t) || (!t.is_empty() && helper(p, &t[1..])),
            (Some(b'?'), Some(_)) => helper(&p[1..], &t[1..]),
            (Some(&pc), Some(&tc)) if pc.eq_ignore_ascii_case(&tc) => helper(&p[1..], &t[1..]),
            _ => false,
        }
    }
    helper(pattern.as_bytes(), text.as_bytes())
}

/// A named selector, used for both `Blocking.ClientGroupsBlock` (selector →
/// group tag) and the upstream tree (selector → upstream group name).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorEntry {
    pub selector: Arc<str>,
    pub target: Arc<str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ip() {
        matches!(ClientSelector::parse("192.168.1.5").unwrap(), ClientSelector::Ip(_));
    }

    #[test]
    fn parses_cidr() {
        matches!(
            ClientSelector::parse("192.168.1.0/24").unwrap(),
            ClientSelector::Cidr(_)
        );
    }

    #[test]
    fn parses_name_glob() {
        matches!(ClientSelector::parse("kids-*").unwrap(), ClientSelector::Name(_));
    }

    #[test]
    fn glob_matches_wildcard() {
        assert!(glob_match("kids-*", "kids-tablet"));
        assert!(!glob_match("kids-*", "parent-laptop"));
        assert!(glob_match("*", "anything"));
    }

    #[test]
    fn cidr_contains() {
        let sel = ClientSelector::parse("192.168.1.0/24").unwrap();
        assert!(sel.matches_ip("192.168.1.42".parse().unwrap()));
        assert!(!sel.matches_ip("10.0.0.1".parse().unwrap()));
    }
}
