//! Ferrous-Resolver domain layer.
//!
//! Dependency-free types shared by every other crate in the workspace:
//! requests/responses, upstream and group configuration, cache keys,
//! blocking state, client selectors, the `Config.*` surface and its
//! `serde`/`toml` loading, and the `thiserror`-based error enum.

pub mod block_handler;
pub mod blocking_state;
pub mod cache_key;
pub mod client_names;
pub mod config;
pub mod errors;
pub mod record_type;
pub mod request;
pub mod response;
pub mod selector;
pub mod upstream;

pub use block_handler::{BlockHandler, BlockReasonKind, BLOCK_RESPONSE_TTL_SECS};
pub use blocking_state::BlockingState;
pub use cache_key::CacheKey;
pub use client_names::{ClientNamesEntry, StaticClientNameMapping, CLIENT_NAMES_CACHE_TTL};
pub use config::{CliOverrides, Config};
pub use errors::ResolverError;
pub use record_type::RecordType;
pub use request::{ClientProtocol, LogContext, Request};
pub use response::{Response, ResponseType};
pub use selector::{glob_match, ClientSelector, SelectorEntry};
pub use upstream::{
    InitStrategy, Upstream, UpstreamGroup, UpstreamProtocol, UpstreamStrategy, DEFAULT_GROUP_NAME,
};
