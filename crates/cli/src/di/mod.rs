use std::sync::Arc;
use std::time::Duration;

use ferrous_resolver_domain::Config;
use ferrous_resolver_infrastructure::chain::ChainHandles;
use ferrous_resolver_infrastructure::{build_chain, BlocklistReload, CacheCompaction};
use ferrous_resolver_jobs::{JobRunner, ReloadJob};
use tokio_util::sync::CancellationToken;
use tracing::info;

const BLOCKLIST_SYNC_INTERVAL: Duration = Duration::from_secs(24 * 3600);
const CACHE_COMPACTION_INTERVAL: Duration = Duration::from_secs(300);

/// Everything the binary needs after dependency-injection wiring: the
/// resolver chain head, and a [`JobRunner`] with the background jobs that
/// keep it fresh already registered.
pub struct Application {
    pub chain: ChainHandles,
    pub jobs: JobRunner,
    pub shutdown: CancellationToken,
}

pub async fn wire(config: &Config) -> anyhow::Result<Application> {
    let chain = build_chain(config).await?;
    let shutdown = CancellationToken::new();

    let mut jobs = JobRunner::new().with_cancellation(shutdown.clone());

    if config.blocking.enabled
        && (!config.blocking.black_lists.is_empty() || !config.blocking.white_lists.is_empty())
    {
        let reload = BlocklistReload::new(
            config.blocking.black_lists.clone(),
            config.blocking.white_lists.clone(),
            Arc::clone(&chain.blacklist),
            Arc::clone(&chain.whitelist),
        )?;
        jobs = jobs.with_job(ReloadJob::new(Arc::new(reload), BLOCKLIST_SYNC_INTERVAL));
        info!("registered blocklist sync job");
    }

    if !config.caching.caching_disabled() {
        let compaction = CacheCompaction::new(Arc::clone(&chain.cache));
        jobs = jobs.with_job(ReloadJob::new(Arc::new(compaction), CACHE_COMPACTION_INTERVAL));
        info!("registered cache compaction job");
    }

    Ok(Application { chain, jobs, shutdown })
}
