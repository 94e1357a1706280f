use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::duration::parse_duration;

/// Storage for rehosted inline images
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// Directory holding rehosted files, created on demand
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Files older than this are swept before each save
    #[serde(default = "default_retention")]
    pub retention: String,
    /// Externally reachable base URL used to build image links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: Url,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            retention: default_retention(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl ImagesConfig {
    /// Parsed retention window
    ///
    /// # Errors
    ///
    /// Returns an error if `retention` is not a valid duration
    pub fn retention(&self) -> anyhow::Result<Duration> {
        parse_duration("images.retention", &self.retention)
    }
}

/// Parse and check an externally reachable base URL
///
/// Only `http` and `https` are accepted. When no port is given the
/// scheme's default (80 or 443) applies.
///
/// # Errors
///
/// Returns an error if the URL does not parse or uses another scheme
pub fn parse_public_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("invalid base URL '{raw}': {e}"))?;
    check_web_scheme("base URL", &url)?;
    Ok(url)
}

pub(crate) fn check_web_scheme(what: &str, url: &Url) -> anyhow::Result<()> {
    match url.scheme() {
        "http" | "https" if url.port_or_known_default().is_some() && url.has_host() => Ok(()),
        other => anyhow::bail!("unsupported {what} scheme '{other}' in {url}"),
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("images")
}

fn default_retention() -> String {
    "1m".to_owned()
}

fn default_public_base_url() -> Url {
    Url::parse("http://localhost").expect("valid default URL")
}
