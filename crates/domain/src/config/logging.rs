use serde::{Deserialize, Serialize};

/// Logging configuration, wired to `tracing`/`tracing-subscriber` rather
/// than a bespoke logger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit newline-delimited JSON instead of the human-readable formatter.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}
