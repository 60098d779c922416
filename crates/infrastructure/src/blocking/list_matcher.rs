//! `ListMatcher` : per-group domain membership, backed by a hash
//! set plus a suffix trie ("hash set + suffix tree acceptable").
//! Reloadable as a whole via [`arc_swap::ArcSwap`], keyed by group name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use ferrous_resolver_application::ports::ListMatcher;
use rustc_hash::FxBuildHasher;

use super::suffix_trie::SuffixTrie;

struct GroupEntries {
    exact: HashSet<Arc<str>, FxBuildHasher>,
    suffixes: SuffixTrie,
}

impl GroupEntries {
    fn is_match(&self, fqdn: &str) -> bool {
        self.exact.contains(fqdn) || self.suffixes.lookup(fqdn)
    }
}

fn build_index(raw: &HashMap<String, Vec<String>>) -> HashMap<Arc<str>, GroupEntries> {
    raw.iter()
        .map(|(group, domains)| {
            let mut exact = HashSet::with_hasher(FxBuildHasher);
            let mut suffixes = SuffixTrie::new();
            for domain in domains {
                let lower: Arc<str> = Arc::from(domain.to_ascii_lowercase());
                suffixes.insert(&lower);
                exact.insert(lower);
            }
            (Arc::from(group.as_str()), GroupEntries { exact, suffixes })
        })
        .collect()
}

/// A group-keyed domain matcher, swappable as a whole on blocklist reload.
pub struct DomainListMatcher {
    index: ArcSwap<HashMap<Arc<str>, GroupEntries>>,
}

impl DomainListMatcher {
    pub fn new(raw: &HashMap<String, Vec<String>>) -> Self {
        Self {
            index: ArcSwap::from_pointee(build_index(raw)),
        }
    }

    pub fn reload(&self, raw: &HashMap<String, Vec<String>>) {
        self.index.store(Arc::new(build_index(raw)));
    }

    pub fn total_domains(&self) -> usize {
        self.index.load().values().map(|g| g.exact.len()).sum()
    }
}

impl ListMatcher for DomainListMatcher {
    fn matches(&self, fqdn: &str, groups_to_check: &[Arc<str>]) -> Option<Arc<str>> {
        let index = self.index.load();
        let fqdn = fqdn.trim_end_matches('.');
        groups_to_check
            .iter()
            .find(|group| index.get(*group).is_some_and(|entries| entries.is_match(fqdn)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> DomainListMatcher {
        let mut raw = HashMap::new();
        raw.insert("kids".to_string(), vec!["ads.example".to_string()]);
        DomainListMatcher::new(&raw)
    }

    #[test]
    fn matches_exact_and_subdomain() {
        let m = matcher();
        let groups: Vec<Arc<str>> = vec![Arc::from("kids")];
        assert_eq!(m.matches("ads.example", &groups), Some(Arc::from("kids")));
        assert_eq!(m.matches("foo.ads.example", &groups), Some(Arc::from("kids")));
        assert_eq!(m.matches("example.com", &groups), None);
    }

    #[test]
    fn restricted_to_groups_to_check() {
        let m = matcher();
        let groups: Vec<Arc<str>> = vec![Arc::from("guests")];
        assert_eq!(m.matches("ads.example", &groups), None);
    }
}
