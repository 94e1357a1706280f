#![allow(clippy::must_use_candidate)]

pub mod chat;
pub mod cors;
mod duration;
mod env;
pub mod health;
pub mod imagegen;
pub mod images;
mod loader;
pub mod server;
pub mod telemetry;
pub mod upstream;

use serde::Deserialize;

pub use chat::*;
pub use cors::*;
pub use health::*;
pub use imagegen::*;
pub use images::*;
pub use server::*;
pub use telemetry::TelemetryConfig;
pub use upstream::*;

/// Top-level Parley configuration
///
/// Every section has defaults, so an empty file (or no file at all)
/// yields a working gateway pointed at the production upstream.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listener, health and CORS configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream conversational API
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Chat completion model policy
    #[serde(default)]
    pub chat: ChatConfig,
    /// Rehosted inline image storage
    #[serde(default)]
    pub images: ImagesConfig,
    /// Image generation pipeline
    #[serde(default)]
    pub imagegen: ImageGenConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
