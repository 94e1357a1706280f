use http::StatusCode;
use parley_core::HttpError;
use thiserror::Error;

use crate::token::TokenError;

/// Errors raised while talking to the upstream API
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Credentials could not be produced for the payload
    #[error("failed to generate upstream credentials: {0}")]
    Token(#[from] TokenError),

    /// The request never got a response
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// The upstream answered with something other than 200
    #[error("API error: {0}")]
    Status(u16),

    /// The response body broke off mid-stream
    #[error("upstream stream failed: {0}")]
    Stream(String),

    /// A configured header value is not a valid HTTP header
    #[error("invalid upstream header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },
}

impl HttpError for UpstreamError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Status(code) => StatusCode::from_u16(*code)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Token(_) | Self::Transport(_) | Self::Stream(_) | Self::InvalidHeader { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Token(_) => "token_error",
            Self::Transport(_) | Self::Stream(_) => "transport_error",
            Self::Status(_) => "upstream_error",
            Self::InvalidHeader { .. } => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Token(_) => "failed to generate upstream credentials".to_owned(),
            Self::InvalidHeader { .. } => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}
