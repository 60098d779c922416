//! Background timer tasks: blocklist refresh and cache compaction (
//! "refreshed on a timer"), built on `tokio_util`'s cancellation token
//! rather than a raw `JoinHandle`.

pub mod reload_job;
pub mod runner;

pub use reload_job::ReloadJob;
pub use runner::JobRunner;
