use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use parley_config::{Config, DEFAULT_PORT, parse_public_base_url};

/// Parley, an OpenAI-compatible gateway
#[derive(Debug, Parser)]
#[command(name = "parley", about = "OpenAI-compatible gateway for the ChatOn API")]
pub struct Args {
    /// Preferred listen port
    pub port: Option<String>,

    /// Public base URL used in image links
    pub base_url: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Load the configuration file, or the defaults when none is given
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Ok(Config::default()),
        }
    }

    /// Apply the positional overrides on top of the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http or https URL
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(raw) = &self.port {
            let port = parse_port(raw).unwrap_or_else(|| {
                tracing::warn!(port = %raw, default = DEFAULT_PORT, "invalid port, using default");
                DEFAULT_PORT
            });
            let ip = config.server.listen_address().ip();
            config.server.listen_address = Some(SocketAddr::new(ip, port));
        }

        if let Some(raw) = &self.base_url {
            config.images.public_base_url = parse_public_base_url(raw)?;
        }

        Ok(())
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|port| *port != 0)
}
