use serde::Deserialize;

/// Chat completion model policy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Models the upstream accepts, also served by `/v1/models`
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Substituted for any requested model outside `models`
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            fallback_model: default_fallback_model(),
        }
    }
}

fn default_models() -> Vec<String> {
    ["gpt-4o", "gpt-4o-mini", "claude-3-5-sonnet", "claude"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn default_fallback_model() -> String {
    "claude-3-5-sonnet".to_owned()
}
