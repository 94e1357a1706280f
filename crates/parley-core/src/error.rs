use http::StatusCode;
use serde_json::{Value, json};

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. The handlers convert
/// these into `{"error": "<message>"}` bodies, keeping domain errors
/// decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error kind, used for logging
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// JSON body sent to the caller
    fn error_body(&self) -> Value {
        json!({ "error": self.client_message() })
    }
}
