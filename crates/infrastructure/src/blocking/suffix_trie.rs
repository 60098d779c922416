//! Reversed-label suffix trie for wildcard domain matching: a plain
//! presence trie rather than a bitmask-per-source structure, since each
//! inserted domain blocks itself (via the caller's exact set) and every
//! subdomain of itself (via this trie).

use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap;

#[derive(Default)]
struct TrieNode {
    children: HashMap<CompactString, TrieNode, FxBuildHasher>,
    terminal: bool,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::with_hasher(FxBuildHasher),
            terminal: false,
        }
    }
}

/// Insert `example.com` and `sub.ads.example.com` matches but `example.com`
/// itself does not (that's the caller's exact-set job).
#[derive(Default)]
pub struct SuffixTrie {
    root: TrieNode,
}

impl SuffixTrie {
    pub fn new() -> Self {
        Self { root: TrieNode::new() }
    }

    pub fn insert(&mut self, domain: &str) {
        let mut node = &mut self.root;
        for label in domain.split('.').rev() {
            node = node.children.entry(CompactString::new(label)).or_default();
        }
        node.terminal = true;
    }

    pub fn lookup(&self, domain: &str) -> bool {
        let labels: Vec<&str> = domain.split('.').rev().collect();
        let n = labels.len();
        let mut node = &self.root;
        for (i, label) in labels.iter().enumerate() {
            match node.children.get(*label) {
                Some(child) => {
                    if child.terminal && i + 1 < n {
                        return true;
                    }
                    node = child;
                }
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_subdomain_not_self() {
        let mut trie = SuffixTrie::new();
        trie.insert("ads.example.com");
        assert!(trie.lookup("sub.ads.example.com"));
        assert!(trie.lookup("a.b.ads.example.com"));
        assert!(!trie.lookup("ads.example.com"));
        assert!(!trie.lookup("example.com"));
    }
}
