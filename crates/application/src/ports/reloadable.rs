use async_trait::async_trait;
use ferrous_resolver_domain::ResolverError;

/// Anything a background job can refresh on a timer: the blocklist/allowlist
/// matcher ("refreshed on a timer") or the cache compactor.
/// Concrete implementations live in infrastructure; jobs only see this port.
#[async_trait]
pub trait Reloadable: Send + Sync {
    async fn reload(&self) -> Result<(), ResolverError>;

    /// Stable name used in job log lines.
    fn name(&self) -> &'static str;
}
