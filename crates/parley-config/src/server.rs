use std::net::{Ipv4Addr, SocketAddr};

use serde::Deserialize;

use crate::{cors::CorsConfig, health::HealthConfig};

/// Port used when neither the config nor the command line names one
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Preferred listen address, `0.0.0.0:8080` when unset
    #[serde(default)]
    pub listen_address: Option<SocketAddr>,
    /// Probe upward for a free port when the preferred one is taken
    #[serde(default = "default_port_fallback")]
    pub port_fallback: bool,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            port_fallback: true,
            health: HealthConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Effective listen address
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_port_fallback() -> bool {
    true
}
