//! Expiring by-IP cache for resolved client names (TTL 1 hour).

use std::net::IpAddr;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use ferrous_resolver_domain::ClientNamesEntry;

#[derive(Default)]
pub struct ClientNamesCache {
    entries: DashMap<IpAddr, ClientNamesEntry>,
}

impl ClientNamesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ip: IpAddr) -> Option<Vec<Arc<str>>> {
        let now = SystemTime::now();
        let entry = self.entries.get(&ip)?;
        if entry.is_expired(now) {
            drop(entry);
            self.entries.remove(&ip);
            return None;
        }
        Some(entry.names.clone())
    }

    pub fn put(&self, ip: IpAddr, names: Vec<Arc<str>>) {
        self.entries.insert(ip, ClientNamesEntry::fresh(names, SystemTime::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_until_read_back() {
        let cache = ClientNamesCache::new();
        let ip: IpAddr = "192.168.1.5".parse().unwrap();
        assert!(cache.get(ip).is_none());
        cache.put(ip, vec![Arc::from("laptop")]);
        assert_eq!(cache.get(ip).unwrap(), vec![Arc::<str>::from("laptop")]);
    }
}
