use http::StatusCode;
use parley_core::HttpError;
use parley_upstream::UpstreamError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Image generation errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Invalid request parameters
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Storage lookup or image download did not get a usable response
    #[error("{0}")]
    Transport(String),

    /// The upstream reply did not lead to an image
    #[error("{0}")]
    Resolution(String),
}

impl HttpError for ImageGenError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(e) => e.status_code(),
            Self::Transport(_) | Self::Resolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Upstream(e) => e.error_type(),
            Self::Transport(_) => "transport_error",
            Self::Resolution(_) => "resolution_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Upstream(e) => e.client_message(),
            other => other.to_string(),
        }
    }
}
