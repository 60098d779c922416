use std::sync::Arc;

/// `ListMatcher` port : membership test for block/allow lists, organized
/// by group. The backing implementation may represent millions of entries
/// (hash set + suffix tree).
pub trait ListMatcher: Send + Sync {
    /// Tests `fqdn` against each of `groups_to_check`; returns the first
    /// matching group, if any.
    fn matches(&self, fqdn: &str, groups_to_check: &[Arc<str>]) -> Option<Arc<str>>;
}
