use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// TTL for [`ClientNamesCache`] entries: 1 hour.
pub const CLIENT_NAMES_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A cached rDNS result for one client IP, returned by copy.
#[derive(Debug, Clone)]
pub struct ClientNamesEntry {
    pub names: Vec<Arc<str>>,
    pub expires_at: SystemTime,
}

impl ClientNamesEntry {
    pub fn fresh(names: Vec<Arc<str>>, now: SystemTime) -> Self {
        Self {
            names,
            expires_at: now + CLIENT_NAMES_CACHE_TTL,
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

/// Static `name -> [ip, ...]` override mapping consulted before any upstream
/// PTR query (`ClientLookup.ClientnameIPMapping`).
#[derive(Debug, Clone, Default)]
pub struct StaticClientNameMapping {
    entries: Vec<(Arc<str>, Vec<IpAddr>)>,
}

impl StaticClientNameMapping {
    pub fn new(entries: Vec<(Arc<str>, Vec<IpAddr>)>) -> Self {
        Self { entries }
    }

    /// Linear scan matching: "names accumulate on multi-match" — every
    /// configured name whose IP list contains `ip` is returned, in
    /// configuration order.
    pub fn names_for(&self, ip: IpAddr) -> Vec<Arc<str>> {
        self.entries
            .iter()
            .filter(|(_, ips)| ips.contains(&ip))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_mapping_accumulates_multi_match() {
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        let mapping = StaticClientNameMapping::new(vec![
            (Arc::from("laptop"), vec![ip]),
            (Arc::from("kids-device"), vec![ip]),
            (Arc::from("other"), vec!["10.0.0.1".parse().unwrap()]),
        ]);
        let names = mapping.names_for(ip);
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.as_ref() == "laptop"));
        assert!(names.iter().any(|n| n.as_ref() == "kids-device"));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let now = SystemTime::now();
        let entry = ClientNamesEntry::fresh(vec![Arc::from("host")], now);
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + CLIENT_NAMES_CACHE_TTL + Duration::from_secs(1)));
    }
}
