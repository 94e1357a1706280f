//! Flattening of `OpenAI` messages into upstream messages
//!
//! Text parts collapse into one string per message. Inline `data:image/`
//! URIs are rehosted through the [`ImageStore`] so the upstream can fetch
//! them by URL; any other image URL is passed through untouched.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parley_config::ChatConfig;
use parley_images::ImageStore;
use parley_upstream::{GenerationParams, UpstreamImage, UpstreamMessage};

use crate::error::ChatError;
use crate::protocol::openai::{ChatMessage, ChatRequest, ContentPart, MessageContent};

const INLINE_IMAGE_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = "base64,";

/// A chat request ready for the upstream
#[derive(Debug)]
pub struct NormalizedChat {
    pub messages: Vec<UpstreamMessage>,
    pub params: GenerationParams,
    pub stream: bool,
}

/// Normalize every message and resolve the effective model
///
/// # Errors
///
/// Returns `ChatError::EmptyContent` when no message survives,
/// `ChatError::InvalidDataUri` for an undecodable inline image, and
/// `ChatError::ImageStore` when rehosting fails
pub async fn normalize(
    request: ChatRequest,
    images: &ImageStore,
    config: &ChatConfig,
) -> Result<NormalizedChat, ChatError> {
    let params = GenerationParams {
        model: resolve_model(request.model(), config),
        temperature: request.temperature(),
        top_p: request.top_p(),
        max_tokens: request.max_tokens(),
    };
    let stream = request.stream();

    let mut messages = Vec::with_capacity(request.messages.len());
    for message in request.messages {
        if let Some(normalized) = normalize_message(message, images).await? {
            messages.push(normalized);
        }
    }

    if messages.is_empty() {
        return Err(ChatError::EmptyContent);
    }

    Ok(NormalizedChat {
        messages,
        params,
        stream,
    })
}

/// Keep allow-listed models, replace anything else with the fallback
pub fn resolve_model(requested: &str, config: &ChatConfig) -> String {
    if config.models.iter().any(|m| m == requested) {
        return requested.to_owned();
    }

    tracing::debug!(requested, fallback = %config.fallback_model, "unknown model replaced by fallback");
    config.fallback_model.clone()
}

async fn normalize_message(message: ChatMessage, images: &ImageStore) -> Result<Option<UpstreamMessage>, ChatError> {
    let (content, attached) = match message.content {
        Some(MessageContent::Text(text)) => (text.trim().to_owned(), Vec::new()),
        Some(MessageContent::Parts(parts)) => flatten_parts(parts, images).await?,
        Some(MessageContent::Other(_)) | None => return Ok(None),
    };

    if content.is_empty() && attached.is_empty() {
        return Ok(None);
    }

    Ok(Some(UpstreamMessage {
        role: message.role,
        content,
        images: attached,
    }))
}

async fn flatten_parts(
    parts: Vec<ContentPart>,
    images: &ImageStore,
) -> Result<(String, Vec<UpstreamImage>), ChatError> {
    let mut texts = Vec::new();
    let mut attached = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text { text } => texts.push(text),
            ContentPart::ImageUrl { image_url } if !image_url.url.trim().is_empty() => {
                let data = rehost(&image_url.url, images).await?;
                attached.push(UpstreamImage { data });
            }
            ContentPart::ImageUrl { .. } | ContentPart::Unsupported => {}
        }
    }

    Ok((texts.join(" ").trim().to_owned(), attached))
}

async fn rehost(url: &str, images: &ImageStore) -> Result<String, ChatError> {
    let Some(inline) = InlineImage::parse(url)? else {
        tracing::debug!(url, "passing through external image URL");
        return Ok(url.to_owned());
    };

    let asset = images.save(&inline.bytes, &inline.mime).await?;
    Ok(asset.url)
}

/// Decoded `data:image/<subtype>;base64,<payload>` URI
#[derive(Debug, PartialEq, Eq)]
pub struct InlineImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    /// Returns `None` for anything that is not an inline image URI
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidDataUri` if the marker is missing or the
    /// payload is not valid base64
    pub fn parse(url: &str) -> Result<Option<Self>, ChatError> {
        let Some(rest) = url.strip_prefix(INLINE_IMAGE_PREFIX) else {
            return Ok(None);
        };

        let (header, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| ChatError::InvalidDataUri("missing base64 marker".to_owned()))?;

        let subtype = header.split_once(';').map_or(header, |(subtype, _)| subtype).trim();
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ChatError::InvalidDataUri(e.to_string()))?;

        Ok(Some(Self {
            mime: format!("image/{subtype}"),
            bytes,
        }))
    }
}
