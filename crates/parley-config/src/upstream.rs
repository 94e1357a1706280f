use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Upstream conversational API configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// API root; chat calls go to `/chats/stream`, storage lookups to `/storage/`
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// `User-Agent` sent on every upstream call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// `Client-time-zone` header value
    #[serde(default = "default_time_zone")]
    pub client_time_zone: String,
    /// `Accept-Language` header value
    #[serde(default = "default_language")]
    pub accept_language: String,
    /// `X-Cl-Options` header value
    #[serde(default = "default_client_options")]
    pub client_options: String,
    /// Upper bound on upstream calls in flight across all requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Credential source for upstream calls
    #[serde(default)]
    pub token: Option<TokenConfig>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            client_time_zone: default_time_zone(),
            accept_language: default_language(),
            client_options: default_client_options(),
            max_concurrent_requests: default_max_concurrent_requests(),
            token: None,
        }
    }
}

/// How upstream credentials are produced for a request payload
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenConfig {
    /// External generator: receives the payload on stdin and prints the
    /// authorization value and the date on its first two stdout lines
    Command {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Fixed authorization value, dated at request time
    Static { authorization: SecretString },
}

fn default_base_url() -> Url {
    Url::parse("https://api.chaton.ai").expect("valid default URL")
}

fn default_user_agent() -> String {
    "ChatOn_Android/1.53.502".to_owned()
}

fn default_time_zone() -> String {
    "-05:00".to_owned()
}

fn default_language() -> String {
    "en-US".to_owned()
}

fn default_client_options() -> String {
    "hb".to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_concurrent_requests() -> usize {
    64
}
