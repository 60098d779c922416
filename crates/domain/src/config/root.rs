use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ResolverError;

use super::{
    BlockingConfig, BootstrapDnsConfig, CachingConfig, ClientLookupConfig, FiltersConfig,
    LoggingConfig, ServerConfig, UpstreamsConfig,
};

/// Top-level `Config`, composed of the sub-structs in's configuration
/// surface table: a TOML file merged with CLI overrides, then validated
/// once at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstreams: UpstreamsConfig,
    #[serde(default)]
    pub bootstrap_dns: Option<BootstrapDnsConfig>,
    #[serde(default)]
    pub blocking: BlockingConfig,
    #[serde(default)]
    pub caching: CachingConfig,
    #[serde(default)]
    pub client_lookup: ClientLookupConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fields a user may override from the command line, applied after the
/// file is parsed.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub dns_port: Option<u16>,
    pub log_level: Option<String>,
}

impl Config {
    /// Loads `path` (defaulting to `ferrous-resolver.toml` in the current
    /// directory when `None`) and applies `overrides`. A missing file is not
    /// an error — the defaults plus CLI overrides are used.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ResolverError> {
        let path = path.unwrap_or("ferrous-resolver.toml");
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| ResolverError::Config(format!("reading {path}: {e}")))?;
            toml::from_str(&raw).map_err(|e| ResolverError::Config(format!("{path}: {e}")))?
        } else {
            Config::default()
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Startup-fatal validation ("Configuration" error class).
    pub fn validate(&self) -> Result<(), ResolverError> {
        self.upstreams.validate()?;
        if let Some(bootstrap) = &self.bootstrap_dns {
            bootstrap.validate()?;
        }
        for group in &self.upstreams.groups {
            for upstream in &group.upstreams {
                if upstream.is_encrypted() && self.bootstrap_dns.is_none() {
                    return Err(ResolverError::Config(format!(
                        "group '{}' upstream '{}' requires DoT/DoH host resolution but no bootstrap_dns is configured",
                        group.name, upstream.host
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults_plus_overrides() {
        let cfg = Config::load(
            Some("/nonexistent/path/ferrous-resolver.toml"),
            CliOverrides {
                dns_port: Some(5353),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cfg.server.dns_port, 5353);
    }

    #[test]
    fn validate_rejects_missing_default_group() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());
    }
}
