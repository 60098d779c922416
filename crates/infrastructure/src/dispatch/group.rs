use std::sync::Arc;
use std::time::Duration;

use ferrous_resolver_application::ports::UpstreamReply;
use ferrous_resolver_domain::{ClientProtocol, ResolverError, Upstream, UpstreamGroup, UpstreamStrategy};
use tracing::{debug, warn};

use super::resolver_status::ResolverStatus;
use super::weighted_pick::{weighted_pick, weighted_pick_excluding, weighted_pick_two};
use crate::metrics::ChainMetrics;
use crate::transport::RetryingUpstreamClient;

/// Runtime dispatcher for one [`UpstreamGroup`]: owns one
/// [`ResolverStatus`] per configured upstream and implements Strict /
/// ParallelBest / Random selection on top of [`RetryingUpstreamClient`].
pub struct GroupDispatcher {
    group: UpstreamGroup,
    client: Arc<RetryingUpstreamClient>,
    statuses: Vec<ResolverStatus>,
    metrics: Arc<ChainMetrics>,
}

impl GroupDispatcher {
    pub fn new(group: UpstreamGroup, client: Arc<RetryingUpstreamClient>) -> Self {
        Self::with_metrics(group, client, Arc::new(ChainMetrics::default()))
    }

    pub fn with_metrics(
        group: UpstreamGroup,
        client: Arc<RetryingUpstreamClient>,
        metrics: Arc<ChainMetrics>,
    ) -> Self {
        let statuses = group.upstreams.iter().map(|_| ResolverStatus::new()).collect();
        Self {
            group,
            client,
            statuses,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.group.name
    }

    fn weights(&self) -> Vec<u64> {
        self.statuses.iter().map(|s| s.weight()).collect()
    }

    async fn attempt(
        &self,
        query: &[u8],
        idx: usize,
        client_protocol: ClientProtocol,
    ) -> Result<UpstreamReply, ResolverError> {
        let upstream = &self.group.upstreams[idx];
        let result = tokio::time::timeout(
            self.group.timeout,
            self.client.call(query, upstream, client_protocol),
        )
        .await
        .map_err(|_| ResolverError::Timeout)
        .and_then(|inner| inner);

        if let Err(ref e) = result {
            if !matches!(e, ResolverError::Timeout) || e.is_transport_retryable() {
                self.statuses[idx].record_error();
            }
        }
        result
    }

    /// Per-request outer deadline: "100 × Upstreams.Timeout" (§5), bounding
    /// the whole dispatch — every attempt a strategy makes, including
    /// strict's per-upstream loop — rather than just one upstream call.
    fn outer_deadline(&self) -> Duration {
        self.group.timeout * 100
    }

    pub async fn dispatch(
        &self,
        query: &[u8],
        client_protocol: ClientProtocol,
    ) -> Result<UpstreamReply, ResolverError> {
        if self.group.upstreams.is_empty() {
            return Err(ResolverError::AllUpstreamsFailed(format!(
                "group '{}' has no upstreams",
                self.group.name
            )));
        }
        let dispatch = async {
            match self.group.strategy {
                UpstreamStrategy::Strict => self.dispatch_strict(query, client_protocol).await,
                UpstreamStrategy::ParallelBest => self.dispatch_parallel_best(query, client_protocol).await,
                UpstreamStrategy::Random => self.dispatch_random(query, client_protocol).await,
            }
        };
        let result = match tokio::time::timeout(self.outer_deadline(), dispatch).await {
            Ok(inner) => inner,
            Err(_) => {
                warn!(group = %self.group.name, "outer dispatch deadline (100x upstream timeout) exceeded");
                Err(ResolverError::Timeout)
            }
        };
        match &result {
            Ok(_) => self.metrics.dispatch.record_success(),
            Err(_) => self.metrics.dispatch.record_failure(),
        }
        result
    }

    async fn dispatch_strict(
        &self,
        query: &[u8],
        client_protocol: ClientProtocol,
    ) -> Result<UpstreamReply, ResolverError> {
        let mut last_err = ResolverError::AllUpstreamsFailed(self.group.name.to_string());
        for idx in 0..self.group.upstreams.len() {
            match self.attempt(query, idx, client_protocol).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    debug!(group = %self.group.name, idx, error = %e, "strict attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    /// Races the two candidates without ever discarding an in-flight
    /// attempt: `future::select` hands back the still-running loser rather
    /// than dropping it, so a first-to-settle error falls back to awaiting
    /// that same original attempt instead of issuing a fresh query.
    async fn dispatch_parallel_best(
        &self,
        query: &[u8],
        client_protocol: ClientProtocol,
    ) -> Result<UpstreamReply, ResolverError> {
        let weights = self.weights();
        let Some((a, b)) = weighted_pick_two(&weights) else {
            return self.dispatch_strict(query, client_protocol).await;
        };

        let fut_a = Box::pin(self.attempt(query, a, client_protocol));
        let fut_b = Box::pin(self.attempt(query, b, client_protocol));

        match futures::future::select(fut_a, fut_b).await {
            futures::future::Either::Left((result_a, remaining_b)) => match result_a {
                Ok(reply) => Ok(reply),
                Err(e_a) => {
                    warn!(group = %self.group.name, "parallel-best first branch failed, awaiting other candidate");
                    remaining_b
                        .await
                        .map_err(|e_b| ResolverError::AllUpstreamsFailed(format!("{e_a}; {e_b}")))
                }
            },
            futures::future::Either::Right((result_b, remaining_a)) => match result_b {
                Ok(reply) => Ok(reply),
                Err(e_b) => {
                    warn!(group = %self.group.name, "parallel-best second branch failed, awaiting other candidate");
                    remaining_a
                        .await
                        .map_err(|e_a| ResolverError::AllUpstreamsFailed(format!("{e_a}; {e_b}")))
                }
            },
        }
    }

    async fn dispatch_random(
        &self,
        query: &[u8],
        client_protocol: ClientProtocol,
    ) -> Result<UpstreamReply, ResolverError> {
        let weights = self.weights();
        let Some(first) = weighted_pick(&weights) else {
            return Err(ResolverError::AllUpstreamsFailed(self.group.name.to_string()));
        };
        match self.attempt(query, first, client_protocol).await {
            Ok(reply) => return Ok(reply),
            Err(e) => {
                debug!(group = %self.group.name, idx = first, error = %e, "random attempt failed, rotating");
            }
        }
        match weighted_pick_excluding(&weights, first) {
            Some(second) => self.attempt(query, second, client_protocol).await,
            None => Err(ResolverError::AllUpstreamsFailed(self.group.name.to_string())),
        }
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.group.upstreams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_application::ports::BootstrapResolver;
    use ferrous_resolver_domain::{InitStrategy, UpstreamProtocol};
    use std::net::SocketAddr;
    use std::time::Duration;

    struct NullBootstrap;

    #[async_trait::async_trait]
    impl BootstrapResolver for NullBootstrap {
        async fn upstream_ips(&self, upstream: &Upstream) -> Result<Vec<SocketAddr>, ResolverError> {
            Ok(vec!["127.0.0.1:53".parse::<SocketAddr>().unwrap()].into_iter().map(|a: SocketAddr| {
                SocketAddr::new(a.ip(), upstream.port)
            }).collect())
        }
    }

    fn upstream(host: &str, port: u16) -> Upstream {
        Upstream {
            protocol: UpstreamProtocol::TcpUdp,
            host: Arc::from(host),
            port,
            path: None,
            common_name: None,
            timeout: Duration::from_millis(50),
            proxy: None,
        }
    }

    #[test]
    fn empty_group_reports_all_upstreams_failed() {
        let group = UpstreamGroup {
            name: Arc::from("default"),
            strategy: UpstreamStrategy::Strict,
            upstreams: vec![],
            timeout: Duration::from_millis(50),
            init_strategy: InitStrategy::Fast,
        };
        let client = Arc::new(RetryingUpstreamClient::new(Arc::new(NullBootstrap)));
        let dispatcher = GroupDispatcher::new(group, client);
        let result = tokio_test_block_on(dispatcher.dispatch(b"query", ClientProtocol::Udp));
        assert!(matches!(result, Err(ResolverError::AllUpstreamsFailed(_))));
    }

    fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f)
    }

    #[test]
    fn status_weights_len_matches_upstream_count() {
        let group = UpstreamGroup {
            name: Arc::from("default"),
            strategy: UpstreamStrategy::Random,
            upstreams: vec![upstream("127.0.0.1", 53), upstream("127.0.0.2", 53)],
            timeout: Duration::from_millis(50),
            init_strategy: InitStrategy::Fast,
        };
        let client = Arc::new(RetryingUpstreamClient::new(Arc::new(NullBootstrap)));
        let dispatcher = GroupDispatcher::new(group, client);
        assert_eq!(dispatcher.weights().len(), 2);
    }
}
