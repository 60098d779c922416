//! `Config.*` surface. Each sub-module owns one top-level config key;
//! [`root::Config`] composes them and implements file + CLI-override
//! loading.

pub mod blocking;
pub mod bootstrap;
pub mod caching;
pub mod client_lookup;
pub mod filters;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstreams;

pub use blocking::BlockingConfig;
pub use bootstrap::BootstrapDnsConfig;
pub use caching::CachingConfig;
pub use client_lookup::ClientLookupConfig;
pub use filters::{ConditionalConfig, EcsConfig, FiltersConfig, RewriteConfig};
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstreams::UpstreamsConfig;
