use async_trait::async_trait;
use ferrous_resolver_domain::{Request, ResolverError, Response};
use std::sync::Arc;

/// The chain-stage contract every pipeline node implements.
///
/// A stage MUST either return a fully-formed [`Response`], return an error,
/// or delegate by calling `next.resolve(ctx, request)`. It MUST NOT retain
/// `request` past return — the chain driver treats every call as one-shot.
///
/// Errors propagate unchanged; the outermost caller converts a non-`Ok`
/// result into a DNS SERVFAIL.
#[async_trait]
pub trait ChainStage: Send + Sync {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError>;

    /// Stable type tag used in logs and metrics (e.g. `"blocking"`, `"caching"`).
    fn stage_type(&self) -> &'static str;

    /// Whether this stage currently participates in the chain. A disabled
    /// stage's [`Self::resolve`] MUST still be a valid no-op delegate; callers
    /// that want to skip disabled stages check this before invoking.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Emits this stage's effective configuration as a structured log line.
    /// Default is a no-op so stages with nothing interesting to report don't
    /// have to implement it.
    fn log_config(&self) {}
}

/// Links adjacent stages by handing each one an `Arc` to the next, mirroring
/// `Chain(stages...)`. The final stage in `stages` becomes the chain
/// head returned here; its `next` pointers were already wired by the caller
/// building each stage (constructors take `next: Arc<dyn ChainStage>`).
pub fn describe_chain(stages: &[Arc<dyn ChainStage>]) {
    for stage in stages {
        tracing::info!(stage = stage.stage_type(), enabled = stage.is_enabled(), "chain stage");
        stage.log_config();
    }
}
