use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::reload_job::ReloadJob;

/// Central orchestrator for background jobs: a builder holding a plain
/// `Vec` of reload jobs rather than one field per job type — this
/// workspace's two jobs (blocklist sync, cache compaction) are both
/// [`ReloadJob`] instances.
pub struct JobRunner {
    jobs: Vec<Arc<ReloadJob>>,
    shutdown: CancellationToken,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn with_job(mut self, job: ReloadJob) -> Self {
        self.jobs.push(Arc::new(job.with_cancellation(self.shutdown.clone())));
        self
    }

    /// Starts every registered job. Each spawns its own timer loop; this
    /// call returns once all loops are running, not when they finish.
    pub async fn start(self) {
        info!(count = self.jobs.len(), "starting background job runner");
        for job in self.jobs {
            job.start().await;
        }
        info!("all background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
