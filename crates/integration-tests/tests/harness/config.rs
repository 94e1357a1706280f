//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use parley_config::{Config, CorsConfig, ServerConfig, TokenConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Loopback listener, static upstream token, images under `image_dir`
    pub fn new(upstream_url: &str, image_dir: &Path) -> Self {
        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                ..ServerConfig::default()
            },
            ..Config::default()
        };

        config.upstream.base_url = upstream_url.parse().expect("valid URL");
        config.upstream.token = Some(TokenConfig::Static {
            authorization: SecretString::from("test-token".to_owned()),
        });
        config.images.directory = image_dir.to_path_buf();

        Self { config }
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = config;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Drop the upstream token so every upstream call fails to sign
    pub fn without_token(mut self) -> Self {
        self.config.upstream.token = None;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
