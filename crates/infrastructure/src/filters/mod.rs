pub mod conditional;
pub mod ecs;
pub mod ede;
pub mod fqdn;
pub mod ipv6;
pub mod rewriter;
pub mod special_use;

pub use conditional::ConditionalStage;
pub use ecs::EcsStage;
pub use ede::EdeStage;
pub use fqdn::FqdnOnlyStage;
pub use ipv6::Ipv6DisablingStage;
pub use rewriter::RewriterStage;
pub use special_use::SpecialUseStage;
