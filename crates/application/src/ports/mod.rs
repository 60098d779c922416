pub mod bootstrap;
pub mod chain_stage;
pub mod list_matcher;
pub mod reloadable;
pub mod upstream_client;

pub use bootstrap::BootstrapResolver;
pub use chain_stage::{describe_chain, ChainStage};
pub use list_matcher::ListMatcher;
pub use reloadable::Reloadable;
pub use upstream_client::{UpstreamClient, UpstreamReply};
