use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use ferrous_resolver_domain::{ClientProtocol, InitStrategy, ResolverError, UpstreamGroup};
use tracing::{error, info, warn};

use super::group::GroupDispatcher;
use crate::metrics::ChainMetrics;
use crate::transport::RetryingUpstreamClient;
use crate::wire;

/// Probe query used for init-time verification: `A example.com.`.
fn probe_query() -> Vec<u8> {
    use hickory_proto::op::{Message, MessageType, OpCode, Query};
    use hickory_proto::rr::{DNSClass, Name, RecordType};
    use std::str::FromStr;

    let mut query = Query::new();
    query.set_name(Name::from_str("example.com.").expect("static name"));
    query.set_query_type(RecordType::A);
    query.set_query_class(DNSClass::IN);

    let mut msg = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    msg.set_recursion_desired(true);
    msg.add_query(query);
    wire::to_bytes(&msg).map(|b| b.to_vec()).unwrap_or_default()
}

/// Map of group name to its live [`GroupDispatcher`], hot-swappable as a
/// whole so the Fast init strategy's background resolution can replace the
/// entire snapshot without locking the read path.
pub struct GroupRegistry {
    groups: ArcSwap<HashMap<Arc<str>, Arc<GroupDispatcher>>>,
}

impl GroupRegistry {
    /// Builds every configured group, applying each group's `InitStrategy`.
    /// `FailOnError` groups that never get a single successful probe make
    /// this return an error, aborting startup.
    pub async fn build(
        configs: Vec<UpstreamGroup>,
        client: Arc<RetryingUpstreamClient>,
    ) -> Result<Self, ResolverError> {
        Self::build_with_metrics(configs, client, Arc::new(ChainMetrics::default())).await
    }

    pub async fn build_with_metrics(
        configs: Vec<UpstreamGroup>,
        client: Arc<RetryingUpstreamClient>,
        metrics: Arc<ChainMetrics>,
    ) -> Result<Self, ResolverError> {
        let mut map = HashMap::with_capacity(configs.len());
        let mut fast_pending = Vec::new();

        for config in configs {
            let name: Arc<str> = config.name.clone();
            let init_strategy = config.init_strategy;
            let dispatcher = Arc::new(GroupDispatcher::with_metrics(
                config,
                Arc::clone(&client),
                Arc::clone(&metrics),
            ));

            match init_strategy {
                InitStrategy::FailOnError => {
                    verify_group(&dispatcher).await?;
                    info!(group = %name, "upstream group verified at startup");
                }
                InitStrategy::Blocking => {
                    if verify_group(&dispatcher).await.is_err() {
                        warn!(group = %name, "upstream group failed startup verification, proceeding anyway");
                    }
                }
                InitStrategy::Fast => {
                    fast_pending.push(Arc::clone(&dispatcher));
                }
            }
            map.insert(name, dispatcher);
        }

        let registry = Self {
            groups: ArcSwap::from_pointee(map),
        };
        registry.spawn_fast_verification(fast_pending);
        Ok(registry)
    }

    /// Fast init returns immediately; verification runs in the background
    /// and only logs, since the dispatcher is already live and serving.
    fn spawn_fast_verification(&self, pending: Vec<Arc<GroupDispatcher>>) {
        for dispatcher in pending {
            tokio::spawn(async move {
                match verify_group(&dispatcher).await {
                    Ok(()) => info!(group = dispatcher.name(), "fast-init verification succeeded"),
                    Err(e) => error!(group = dispatcher.name(), error = %e, "fast-init verification failed"),
                }
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<GroupDispatcher>> {
        self.groups.load().get(name).cloned()
    }

    /// Atomically replaces the whole group snapshot, used by hot-reload.
    pub fn swap(&self, map: HashMap<Arc<str>, Arc<GroupDispatcher>>) {
        self.groups.store(Arc::new(map));
    }
}

/// Issues the probe query and requires a well-formed response (any rcode
/// counts as "the group answered"; only transport failure counts as unverified).
async fn verify_group(dispatcher: &GroupDispatcher) -> Result<(), ResolverError> {
    let query = probe_query();
    dispatcher.dispatch(&query, ClientProtocol::Udp).await.map(|_| ())
}
