use std::time::Duration;

use serde::Deserialize;

use crate::duration::parse_duration;

/// Image generation pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenConfig {
    /// Prefix the upstream puts in front of storage keys in image markdown
    #[serde(default = "default_internal_prefix")]
    pub internal_prefix: String,
    /// Timeout for the storage URL lookup
    #[serde(default = "default_storage_timeout")]
    pub storage_timeout: String,
    /// Timeout for downloading the generated image
    #[serde(default = "default_download_timeout")]
    pub download_timeout: String,
    /// Upstream model used for drawing
    #[serde(default = "default_model")]
    pub model: String,
    /// `image_aspect_ratio` sent upstream
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// `image_style` sent upstream
    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            internal_prefix: default_internal_prefix(),
            storage_timeout: default_storage_timeout(),
            download_timeout: default_download_timeout(),
            model: default_model(),
            aspect_ratio: default_aspect_ratio(),
            style: default_style(),
        }
    }
}

impl ImageGenConfig {
    /// Parsed storage lookup timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `storage_timeout` is not a valid duration
    pub fn storage_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("imagegen.storage_timeout", &self.storage_timeout)
    }

    /// Parsed download timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `download_timeout` is not a valid duration
    pub fn download_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("imagegen.download_timeout", &self.download_timeout)
    }
}

fn default_internal_prefix() -> String {
    "https://spc.unk/".to_owned()
}

fn default_storage_timeout() -> String {
    "10s".to_owned()
}

fn default_download_timeout() -> String {
    "30s".to_owned()
}

fn default_model() -> String {
    "gpt-4o".to_owned()
}

fn default_aspect_ratio() -> String {
    "1:1".to_owned()
}

fn default_style() -> String {
    "photographic".to_owned()
}
