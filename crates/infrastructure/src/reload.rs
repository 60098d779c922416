//! [`Reloadable`] adapters wiring the blocklist compiler and the cache into
//! the `jobs` crate's timer-driven refresh ("refreshed on a timer"
//! prefetch/compaction), split per-concern rather than one god-object.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ferrous_resolver_application::ports::Reloadable;
use ferrous_resolver_domain::ResolverError;
use tracing::info;

use crate::blocking::{DomainListMatcher, ListSourceFetcher};
use crate::cache::Cache;

/// Refetches every configured blacklist/whitelist source and swaps both
/// matchers atomically (`Blocking.BlackLists`/`WhiteLists`).
pub struct BlocklistReload {
    fetcher: ListSourceFetcher,
    black_sources: HashMap<String, Vec<String>>,
    white_sources: HashMap<String, Vec<String>>,
    blacklist: Arc<DomainListMatcher>,
    whitelist: Arc<DomainListMatcher>,
}

impl BlocklistReload {
    pub fn new(
        black_sources: HashMap<String, Vec<String>>,
        white_sources: HashMap<String, Vec<String>>,
        blacklist: Arc<DomainListMatcher>,
        whitelist: Arc<DomainListMatcher>,
    ) -> Result<Self, ResolverError> {
        Ok(Self {
            fetcher: ListSourceFetcher::new()?,
            black_sources,
            white_sources,
            blacklist,
            whitelist,
        })
    }
}

#[async_trait]
impl Reloadable for BlocklistReload {
    async fn reload(&self) -> Result<(), ResolverError> {
        let compiled_black = self.fetcher.compile(&self.black_sources).await;
        let compiled_white = self.fetcher.compile(&self.white_sources).await;
        let black_domains: usize = compiled_black.values().map(Vec::len).sum();
        let white_domains: usize = compiled_white.values().map(Vec::len).sum();
        self.blacklist.reload(&compiled_black);
        self.whitelist.reload(&compiled_white);
        info!(black_domains, white_domains, "blocklist sources reloaded");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "blocklist_sync"
    }
}

/// Sweeps expired entries out of the answer cache on a timer rather than
/// relying solely on lazy eviction at read time.
pub struct CacheCompaction {
    cache: Arc<Cache>,
}

impl CacheCompaction {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Reloadable for CacheCompaction {
    async fn reload(&self) -> Result<(), ResolverError> {
        let removed = self.cache.compact_expired();
        info!(removed, remaining = self.cache.len(), "cache compaction swept expired entries");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cache_compaction"
    }
}
