use ferrous_resolver_domain::{CliOverrides, Config};
use tracing::info;

/// Loads and validates `Config`: load, then validate once at startup.
pub fn load_config(config_path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(config_path, overrides)?;
    config.validate()?;

    info!(
        config_file = config_path.unwrap_or("default"),
        dns_port = config.server.dns_port,
        bind = %config.server.bind_address,
        groups = config.upstreams.groups.len(),
        "configuration loaded"
    );

    Ok(config)
}
