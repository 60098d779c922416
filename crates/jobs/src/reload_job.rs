use std::sync::Arc;
use std::time::Duration;

use ferrous_resolver_application::ports::Reloadable;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs one [`Reloadable`] on a fixed interval until cancelled. Generalized
/// to any reloadable target so the same job type drives both blocklist
/// refresh ("refreshed on a timer") and cache compaction.
pub struct ReloadJob {
    target: Arc<dyn Reloadable>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ReloadJob {
    pub fn new(target: Arc<dyn Reloadable>, interval: Duration) -> Self {
        Self {
            target,
            interval,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawns the timer loop. The first tick fires only after `interval`
    /// elapses — the chain's initial build already loaded the data once, so
    /// reloading immediately on startup would be redundant.
    pub async fn start(self: Arc<Self>) {
        let name = self.target.name();
        info!(job = name, interval_secs = self.interval.as_secs(), "starting reload job");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!(job = name, "reload job shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match self.target.reload().await {
                            Ok(()) => info!(job = name, "reload completed"),
                            Err(e) => error!(job = name, error = %e, "reload failed"),
                        }
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ferrous_resolver_domain::ResolverError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReloadable(AtomicUsize);

    #[async_trait]
    impl Reloadable for CountingReloadable {
        async fn reload(&self) -> Result<(), ResolverError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn stops_on_cancellation() {
        let target = Arc::new(CountingReloadable(AtomicUsize::new(0)));
        let job = Arc::new(ReloadJob::new(target.clone(), Duration::from_millis(10)));
        let token = job.cancellation();
        Arc::clone(&job).start().await;
        tokio::time::sleep(Duration::from_millis(35)).await;
        token.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let count_at_cancel = target.0.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(target.0.load(Ordering::SeqCst), count_at_cancel);
        assert!(count_at_cancel >= 1);
    }
}
