//! `OpenAI` chat completion API wire format types

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_MAX_TOKENS: u32 = 8000;

// -- Request types --

/// `OpenAI` chat completion request
///
/// Generation parameters are optional on the wire; the accessors apply
/// the gateway defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Requested model, checked against the allow-list later
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn top_p(&self) -> f64 {
        self.top_p.unwrap_or(DEFAULT_TOP_P)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// `OpenAI` message within a request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// Content is either a string or an array of parts
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    /// Any other JSON shape; the message is dropped
    Other(serde_json::Value),
}

/// Individual content part
///
/// A part that does not decode as a known shape becomes `Unsupported`
/// so the remaining parts of the message survive.
#[derive(Debug, Clone)]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    /// Part types the upstream has no equivalent for, or malformed parts
    Unsupported,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl<'de> Deserialize<'de> for ContentPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match serde_json::from_value::<KnownPart>(value) {
            Ok(KnownPart::Text { text }) => Ok(Self::Text { text }),
            Ok(KnownPart::ImageUrl { image_url }) => Ok(Self::ImageUrl { image_url }),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring undecodable content part");
                Ok(Self::Unsupported)
            }
        }
    }
}

/// Image URL part
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrl {
    /// External URL or `data:image/...;base64,...` URI
    pub url: String,
    #[serde(default)]
    pub detail: Option<String>,
}

fn default_role() -> String {
    "user".to_owned()
}

// -- Response types --

/// `OpenAI` chat completion response
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    /// Always "chat.completion"
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
}

// -- Streaming types --

/// `OpenAI` streaming chunk
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    /// Always "chat.completion.chunk"
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub system_fingerprint: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkDelta {
    pub content: String,
}

// -- Models list types --

/// `OpenAI` models list response
#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
    /// Always "list"
    pub object: &'static str,
    pub data: Vec<Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Model {
    pub id: String,
    /// Always "model"
    pub object: &'static str,
    pub created: u64,
    pub owned_by: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_parameters() {
        let request: ChatRequest = serde_json::from_str(r#"{"messages":[]}"#).unwrap();

        assert_eq!(request.model(), "gpt-4o");
        assert!((request.temperature() - 0.6).abs() < f64::EPSILON);
        assert!((request.top_p() - 0.9).abs() < f64::EPSILON);
        assert_eq!(request.max_tokens(), 8000);
        assert!(!request.stream());
    }

    #[test]
    fn null_parameters_use_defaults() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"messages":[],"model":null,"temperature":null,"stream":null}"#).unwrap();

        assert_eq!(request.model(), "gpt-4o");
        assert!(!request.stream());
    }

    #[test]
    fn content_variants() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":[
                {"role":"user","content":"plain"},
                {"role":"user","content":[{"type":"text","text":"a"},{"type":"image_url","image_url":{"url":"https://x/y.png","detail":"low"}}]},
                {"role":"user","content":null},
                {"role":"user","content":42},
                {"role":"user"}
            ]}"#,
        )
        .unwrap();

        let contents: Vec<_> = request.messages.iter().map(|m| m.content.clone()).collect();
        assert!(matches!(contents[0], Some(MessageContent::Text(ref t)) if t == "plain"));
        assert!(matches!(contents[1], Some(MessageContent::Parts(ref p)) if p.len() == 2));
        assert!(contents[2].is_none());
        assert!(matches!(contents[3], Some(MessageContent::Other(_))));
        assert!(contents[4].is_none());
    }

    #[test]
    fn unknown_part_types_are_unsupported() {
        let part: ContentPart = serde_json::from_str(r#"{"type":"input_audio","input_audio":{}}"#).unwrap();
        assert!(matches!(part, ContentPart::Unsupported));
    }

    #[test]
    fn malformed_parts_are_unsupported() {
        let parts: Vec<ContentPart> = serde_json::from_str(
            r#"[
                {"type":"text","text":"hi"},
                {"type":"image_url","image_url":"https://x/y.png"},
                {"type":"text","text":null},
                "stray"
            ]"#,
        )
        .unwrap();

        assert!(matches!(parts[0], ContentPart::Text { ref text } if text == "hi"));
        assert!(parts[1..].iter().all(|p| matches!(p, ContentPart::Unsupported)));
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let message: ChatMessage = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(message.role, "user");
    }
}
