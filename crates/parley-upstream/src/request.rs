use parley_config::ImageGenConfig;
use serde::Serialize;

use crate::event::UpstreamImage;

const ARTIST_PROMPT: &str =
    "You are a helpful artist, please draw a picture.Based on imagination, draw a picture with user message.";

/// Upstream routing tag chosen from the shape of the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    #[serde(rename = "chat/pro")]
    Chat,
    #[serde(rename = "chat/image_upload")]
    ImageUpload,
    #[serde(rename = "chat/pro_image")]
    ImageGeneration,
}

impl Source {
    /// Image generation wins; otherwise any attached image selects the upload route
    pub fn select(messages: &[UpstreamMessage], image_generation: bool) -> Self {
        if image_generation {
            Self::ImageGeneration
        } else if messages.iter().any(|m| !m.images.is_empty()) {
            Self::ImageUpload
        } else {
            Self::Chat
        }
    }
}

/// Normalized message as the upstream expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<UpstreamImage>,
}

impl UpstreamMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            images: Vec::new(),
        }
    }
}

/// Sampling parameters carried over from the caller
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

/// Payload posted to `/chats/stream`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamRequest {
    pub function_image_gen: bool,
    pub function_web_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_style: Option<String>,
    pub max_tokens: u32,
    pub messages: Vec<UpstreamMessage>,
    pub model: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl UpstreamRequest {
    /// Chat payload for already normalized messages
    pub fn chat(messages: Vec<UpstreamMessage>, params: GenerationParams) -> Self {
        let source = Source::select(&messages, false);

        Self {
            function_image_gen: false,
            function_web_search: true,
            image_aspect_ratio: None,
            image_style: None,
            max_tokens: params.max_tokens,
            messages,
            model: params.model,
            source,
            temperature: Some(params.temperature),
            top_p: Some(params.top_p),
        }
    }

    /// Drawing payload for a text prompt
    pub fn image_generation(prompt: &str, config: &ImageGenConfig) -> Self {
        let messages = vec![
            UpstreamMessage::text("system", ARTIST_PROMPT),
            UpstreamMessage::text("user", format!("Draw: {prompt}")),
        ];

        Self {
            function_image_gen: true,
            function_web_search: true,
            image_aspect_ratio: Some(config.aspect_ratio.clone()),
            image_style: Some(config.style.clone()),
            max_tokens: 8000,
            messages,
            model: config.model.clone(),
            source: Source::ImageGeneration,
            temperature: None,
            top_p: None,
        }
    }
}
