use serde::{Deserialize, Serialize};

use crate::error::ImageGenError;

/// Image generation request following the `OpenAI` API format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRequest {
    /// Text description of the desired image
    #[serde(default)]
    pub prompt: Option<String>,
    /// Response format ("url" or "`b64_json`")
    #[serde(default)]
    pub response_format: Option<String>,
}

impl ImageRequest {
    /// The trimmed prompt
    ///
    /// # Errors
    ///
    /// Returns `ImageGenError::InvalidRequest` if the prompt is missing or blank
    pub fn prompt(&self) -> Result<&str, ImageGenError> {
        let prompt = self
            .prompt
            .as_deref()
            .ok_or_else(|| ImageGenError::InvalidRequest("missing required field: prompt".to_owned()))?
            .trim();

        if prompt.is_empty() {
            return Err(ImageGenError::InvalidRequest("prompt must not be empty".to_owned()));
        }

        Ok(prompt)
    }

    pub fn response_format(&self) -> ResponseFormat {
        self.response_format
            .as_deref()
            .map_or(ResponseFormat::Url, ResponseFormat::parse)
    }
}

/// How the generated image is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Link to the image
    Url,
    /// Base64-encoded image bytes
    B64Json,
}

impl ResponseFormat {
    /// Anything other than `b64_json` (any case, surrounding whitespace ignored) means a URL
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("b64_json") {
            Self::B64Json
        } else {
            Self::Url
        }
    }
}

/// Image generation response following the `OpenAI` API format
#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    /// Unix timestamp of creation
    pub created: u64,
    /// Generated images
    pub data: Vec<ImageData>,
}

/// A single generated image
#[derive(Debug, Clone, Serialize)]
pub struct ImageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
}

impl ImageData {
    pub fn url(url: String) -> Self {
        Self {
            url: Some(url),
            b64_json: None,
        }
    }

    pub fn b64_json(encoded: String) -> Self {
        Self {
            url: None,
            b64_json: Some(encoded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ImageRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn prompt_is_trimmed() {
        assert_eq!(request(r#"{"prompt":"  a red fox "}"#).prompt().unwrap(), "a red fox");
    }

    #[test]
    fn missing_or_blank_prompt_is_rejected() {
        assert!(matches!(request("{}").prompt(), Err(ImageGenError::InvalidRequest(_))));
        assert!(matches!(request(r#"{"prompt":"   "}"#).prompt(), Err(ImageGenError::InvalidRequest(_))));
    }

    #[test]
    fn response_format_parsing() {
        assert_eq!(request("{}").response_format(), ResponseFormat::Url);
        assert_eq!(request(r#"{"response_format":" B64_JSON "}"#).response_format(), ResponseFormat::B64Json);
        assert_eq!(request(r#"{"response_format":"url"}"#).response_format(), ResponseFormat::Url);
        assert_eq!(request(r#"{"response_format":"png"}"#).response_format(), ResponseFormat::Url);
    }

    #[test]
    fn data_serializes_one_field() {
        let value = serde_json::to_value(ImageResponse {
            created: 1,
            data: vec![ImageData::url("https://cdn/y".to_owned())],
        })
        .unwrap();

        assert_eq!(value, serde_json::json!({"created": 1, "data": [{"url": "https://cdn/y"}]}));
    }
}
