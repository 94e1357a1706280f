use serde::{Deserialize, Serialize};

/// One decoded `data:` line of the upstream SSE feed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamEvent {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<UpstreamChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamChoice {
    #[serde(default)]
    pub delta: UpstreamDelta,
}

/// Incremental fragment of the assistant reply
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub images: Vec<UpstreamImage>,
}

/// Image reference, both in request messages and in reply deltas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamImage {
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default() {
        let event: UpstreamEvent = serde_json::from_str(r#"{"choices":[{}]}"#).unwrap();
        assert_eq!(event.model, None);
        assert_eq!(event.choices.len(), 1);
        assert_eq!(event.choices[0].delta, UpstreamDelta::default());
    }

    #[test]
    fn decodes_images() {
        let event: UpstreamEvent = serde_json::from_str(
            r#"{"model":"gpt-4o","choices":[{"delta":{"images":[{"data":"https://a/1"},{"data":"https://a/2"}]}}]}"#,
        )
        .unwrap();

        let images: Vec<&str> = event.choices[0].delta.images.iter().map(|i| i.data.as_str()).collect();
        assert_eq!(images, ["https://a/1", "https://a/2"]);
        assert_eq!(event.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn ignores_unknown_fields() {
        let event: UpstreamEvent =
            serde_json::from_str(r#"{"id":"x","choices":[{"index":0,"delta":{"content":"Hi","role":"assistant"}}]}"#)
                .unwrap();
        assert_eq!(event.choices[0].delta.content.as_deref(), Some("Hi"));
    }
}
