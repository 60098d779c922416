//! Chain driver: wires every stage from `Config`, innermost (dispatch)
//! first, returning the chain head.
//!
//! Order, outermost to innermost: EDE → Conditional → SpecialUse → FqdnOnly
//! → Ecs → Rewriter → Ipv6Disabling → ClientNames → Blocking → Caching →
//! Dispatch. Annotating/filtering stages run first, then Blocking
//! (pre-answer), then Caching, then routing through UpstreamTree → Group →
//! Client. EDE sits outermost since it must observe the final response type
//! after every other stage has had its say, and Conditional sits just inside
//! it since it needs to bypass routing entirely for its matched domains.

use std::sync::Arc;

use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{BlockHandler, Config, ResolverError};

use crate::blocking::{ClientGroupSelector, DomainListMatcher};
use crate::bootstrap::Bootstrap;
use crate::cache::Cache;
use crate::client_names::resolver::ClientNamesResolver;
use crate::dispatch::{DispatchStage, GroupRegistry};
use crate::filters::{ConditionalStage, EcsStage, EdeStage, FqdnOnlyStage, Ipv6DisablingStage, RewriterStage, SpecialUseStage};
use crate::metrics::ChainMetrics;
use crate::transport::RetryingUpstreamClient;
use crate::upstream_tree::UpstreamTree;

/// Everything built alongside the chain that a caller (the `cli` binary,
/// the `jobs` crate) needs a handle to after wiring: the cache for
/// compaction jobs, the list matchers for blocklist-reload jobs, and the
/// group registry for hot-reconfiguration.
pub struct ChainHandles {
    pub head: Arc<dyn ChainStage>,
    pub cache: Arc<Cache>,
    pub blacklist: Arc<DomainListMatcher>,
    pub whitelist: Arc<DomainListMatcher>,
    pub registry: Arc<GroupRegistry>,
    pub tree: Arc<UpstreamTree>,
    pub metrics: Arc<ChainMetrics>,
}

pub async fn build_chain(config: &Config) -> Result<ChainHandles, ResolverError> {
    let metrics = Arc::new(ChainMetrics::default());
    let bootstrap = Arc::new(Bootstrap::new(config.bootstrap_dns.clone()));
    let client = Arc::new(RetryingUpstreamClient::new(bootstrap));
    let registry = Arc::new(
        GroupRegistry::build_with_metrics(config.upstreams.groups.clone(), client, Arc::clone(&metrics)).await?,
    );
    let tree = Arc::new(UpstreamTree::new(config.upstreams.routing.clone())?);

    let dispatch: Arc<dyn ChainStage> = Arc::new(DispatchStage::new(Arc::clone(&tree), Arc::clone(&registry)));

    let cache = Arc::new(Cache::new(config.caching.max_items_count));
    let caching: Arc<dyn ChainStage> = Arc::new(crate::cache::resolver::CachingResolver::new(
        config.caching.clone(),
        Arc::clone(&cache),
        dispatch,
    )?);

    let blacklist = Arc::new(DomainListMatcher::new(&config.blocking.black_lists));
    let whitelist = Arc::new(DomainListMatcher::new(&config.blocking.white_lists));
    let client_groups = ClientGroupSelector::new(&config.blocking.client_groups_block)?;
    let whitelist_only: Vec<Arc<str>> = config
        .blocking
        .whitelist_only_groups()
        .into_iter()
        .map(|g| Arc::from(g.as_str()))
        .collect();
    let block_handler: BlockHandler = config.blocking.block_handler();
    let blocking: Arc<dyn ChainStage> = Arc::new(crate::blocking::BlockingResolver::with_metrics(
        Arc::clone(&whitelist) as Arc<dyn ferrous_resolver_application::ports::ListMatcher>,
        Arc::clone(&blacklist) as Arc<dyn ferrous_resolver_application::ports::ListMatcher>,
        client_groups,
        whitelist_only,
        block_handler,
        Arc::clone(&metrics),
        caching,
    ));

    let client_names: Arc<dyn ChainStage> = Arc::new(ClientNamesResolver::new(&config.client_lookup, blocking)?);

    let ipv6: Arc<dyn ChainStage> = Arc::new(Ipv6DisablingStage::new(config.filters.ipv6_disabling, client_names));

    let rewriter: Arc<dyn ChainStage> = Arc::new(RewriterStage::new(&config.filters.rewrite, ipv6));

    let ecs: Arc<dyn ChainStage> = Arc::new(EcsStage::new(config.filters.ecs.clone(), rewriter));

    let fqdn: Arc<dyn ChainStage> = Arc::new(FqdnOnlyStage::new(ecs));

    let special_use: Arc<dyn ChainStage> = Arc::new(SpecialUseStage::new(fqdn));

    let conditional: Arc<dyn ChainStage> =
        Arc::new(ConditionalStage::new(&config.filters.conditional, Arc::clone(&registry), special_use));

    let head: Arc<dyn ChainStage> = Arc::new(EdeStage::new(config.filters.extended_error_code, conditional));

    Ok(ChainHandles {
        head,
        cache,
        blacklist,
        whitelist,
        registry,
        tree,
        metrics,
    })
}
