use http::StatusCode;
use parley_core::HttpError;
use parley_images::ImageStoreError;
use parley_upstream::UpstreamError;
use thiserror::Error;

/// Errors that can occur while serving a chat completion
#[derive(Debug, Error)]
pub enum ChatError {
    /// Body is not a valid chat request
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Every message normalized to nothing
    #[error("all messages have empty content")]
    EmptyContent,

    /// An inline image could not be decoded
    #[error("invalid image data URI: {0}")]
    InvalidDataUri(String),

    /// An inline image could not be rehosted
    #[error(transparent)]
    ImageStore(#[from] ImageStoreError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl HttpError for ChatError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::EmptyContent | Self::InvalidDataUri(_) => StatusCode::BAD_REQUEST,
            Self::ImageStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(e) => e.status_code(),
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidJson(_) | Self::EmptyContent | Self::InvalidDataUri(_) => "invalid_request_error",
            Self::ImageStore(_) => "internal_error",
            Self::Upstream(e) => e.error_type(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::ImageStore(_) => "failed to store image".to_owned(),
            Self::Upstream(e) => e.client_message(),
            other => other.to_string(),
        }
    }
}
