//! Image generation over the upstream chat API
//!
//! A drawing prompt is sent as an image-generation chat, the markdown
//! image in the reply is resolved through the upstream storage endpoint
//! and the result is returned as a URL or as base64 bytes.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod resolver;
mod server;
mod types;

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::{Json, Router, extract::State, routing::post};
use bytes::Bytes;
use parley_config::ImageGenConfig;
use parley_core::HttpError;
use parley_upstream::UpstreamClient;

pub use error::{ImageGenError, Result};
pub use resolver::extract_image_link;
pub use types::{ImageData, ImageRequest, ImageResponse, ResponseFormat};

pub use server::{ImageGenServerBuilder, Server};

/// Build the image generation server from configuration
///
/// # Errors
///
/// Returns an error if a configured timeout cannot be parsed
pub fn build_server(upstream: UpstreamClient, config: &ImageGenConfig) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        ImageGenServerBuilder::new(upstream, config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize image generation server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for image generation
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/v1/images/generations", post(generate))
}

/// Handle image generation requests
async fn generate(State(server): State<Arc<Server>>, body: Bytes) -> Response {
    let request: ImageRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&ImageGenError::InvalidRequest(format!("invalid JSON: {e}"))),
    };

    match server.generate(&request).await {
        Ok(response) => {
            tracing::debug!("image generation complete");
            Json(response).into_response()
        }
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &ImageGenError) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = %error, error_type = error.error_type(), "image generation failed");
    } else {
        tracing::debug!(error = %error, error_type = error.error_type(), "image generation rejected");
    }

    (status, Json(error.error_body())).into_response()
}
