use ferrous_resolver_domain::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initializes `tracing`: level from config (overridable via `RUST_LOG`),
/// optional newline-delimited JSON for log aggregation.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let subscriber = tracing_subscriber::fmt().with_target(true).with_env_filter(filter);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(level = %config.logging.level, json = config.logging.json, "logging initialized");
}
