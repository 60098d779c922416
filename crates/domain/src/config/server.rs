use serde::{Deserialize, Serialize};

/// Listener configuration for the external-collaborator DNS socket :
/// out of core scope, but a runnable binary needs a bind address.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind_address: String,

    #[serde(default = "default_dns_port")]
    pub dns_port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_dns_port() -> u16 {
    53
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind(),
            dns_port: default_dns_port(),
        }
    }
}
