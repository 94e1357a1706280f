//! Turning the upstream's image markdown into a fetchable image
//!
//! The upstream answers a drawing request with markdown such as
//! `![image](https://spc.unk/<key>)`. The key is looked up under
//! `<base_url>/storage/<key>`, whose JSON body names the public URL in
//! `getUrl`.

use std::sync::LazyLock;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{ImageGenError, Result};

static IMAGE_MARKDOWN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[.*?]\((.*?)\)").unwrap());

/// Target of the first markdown image in `text`
pub fn extract_image_link(text: &str) -> Option<&str> {
    IMAGE_MARKDOWN_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|link| !link.is_empty())
}

#[derive(Deserialize)]
struct StorageEntry {
    #[serde(rename = "getUrl")]
    get_url: Option<String>,
}

/// Resolves image links and downloads images
pub struct Resolver {
    http: Client,
    internal_prefix: String,
    storage_timeout: Duration,
    download_timeout: Duration,
}

impl Resolver {
    pub fn new(http: Client, internal_prefix: String, storage_timeout: Duration, download_timeout: Duration) -> Self {
        Self {
            http,
            internal_prefix,
            storage_timeout,
            download_timeout,
        }
    }

    /// Storage key of an internal link, `None` for an already public one
    pub fn storage_key<'a>(&self, link: &'a str) -> Option<&'a str> {
        link.strip_prefix(&self.internal_prefix)
    }

    /// Public URL for the storage key, as reported by the storage endpoint
    ///
    /// # Errors
    ///
    /// Returns `ImageGenError::Transport` on a network failure, a timeout or
    /// a non-200 status, and `ImageGenError::Resolution` if the body has no
    /// `getUrl`
    pub async fn lookup(&self, storage_url: &str) -> Result<String> {
        tracing::debug!(storage_url, "resolving image storage entry");

        let response = self
            .http
            .get(storage_url)
            .timeout(self.storage_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(storage_url, error = %e, "storage lookup failed");
                ImageGenError::Transport(format!("storage lookup failed: {e}"))
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(storage_url, status = %status, "storage lookup returned error");
            return Err(ImageGenError::Transport(format!("storage lookup returned {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ImageGenError::Transport(format!("storage lookup failed: {e}")))?;

        let entry: StorageEntry = serde_json::from_str(&body)
            .map_err(|e| ImageGenError::Resolution(format!("unreadable storage entry: {e}")))?;

        entry
            .get_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ImageGenError::Resolution("storage entry has no getUrl".to_owned()))
    }

    /// Download an image and base64-encode its bytes
    ///
    /// # Errors
    ///
    /// Returns `ImageGenError::Transport` if the image cannot be fetched
    pub async fn download_base64(&self, url: &str) -> Result<String> {
        tracing::debug!(url, "downloading generated image");

        let response = self
            .http
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url, error = %e, "image download failed");
                ImageGenError::Transport(format!("image download failed: {e}"))
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(url, status = %status, "image download returned error");
            return Err(ImageGenError::Transport(format!("image download returned {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageGenError::Transport(format!("image download failed: {e}")))?;

        Ok(STANDARD.encode(&bytes))
    }
}
