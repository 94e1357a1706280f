//! Axum route handlers for the chat completion and model listing endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::{Stream, StreamExt, future};
use parley_config::ChatConfig;
use parley_core::{HttpError, unix_now};
use parley_images::ImageStore;
use parley_upstream::{FrameStream, Transcript, UpstreamClient, UpstreamRequest};

use crate::aggregate;
use crate::error::ChatError;
use crate::normalize;
use crate::protocol::openai::{ChatRequest, Model, ModelList};
use crate::stream::{ReencodedFrame, reencode};

/// Informational page served on `GET /` and `GET /v1/chat/completions`
pub const WELCOME_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Parley</title>
</head>
<body>
<h1>Parley is running</h1>
<p>This is an OpenAI-compatible API. Send chat completions with
<code>POST /v1/chat/completions</code> and image generations with
<code>POST /v1/images/generations</code>.</p>
</body>
</html>
"#;

/// Shared state for chat route handlers
#[derive(Clone)]
pub struct ChatState {
    inner: Arc<ChatStateInner>,
}

struct ChatStateInner {
    upstream: UpstreamClient,
    images: ImageStore,
    config: ChatConfig,
}

impl ChatState {
    pub fn new(upstream: UpstreamClient, images: ImageStore, config: ChatConfig) -> Self {
        Self {
            inner: Arc::new(ChatStateInner {
                upstream,
                images,
                config,
            }),
        }
    }

    async fn complete(&self, request: ChatRequest) -> Result<Response, ChatError> {
        let chat = normalize::normalize(request, &self.inner.images, &self.inner.config).await?;
        let upstream_request = UpstreamRequest::chat(chat.messages, chat.params);
        let model = upstream_request.model.clone();

        let frames = self.inner.upstream.send(&upstream_request).await?;

        if chat.stream {
            return Ok(stream_response(frames, model).into_response());
        }

        let transcript = Transcript::collect(frames).await?;
        Ok(Json(aggregate::completion(&transcript, &model)).into_response())
    }
}

/// Build the chat router
pub fn chat_router(state: ChatState) -> Router {
    Router::new()
        .route("/", routing::get(welcome))
        .route("/v1/chat/completions", routing::get(welcome).post(chat_completions))
        .route("/v1/models", routing::get(list_models))
        .with_state(state)
}

async fn welcome() -> Html<&'static str> {
    Html(WELCOME_HTML)
}

/// Handle `POST /v1/chat/completions`
async fn chat_completions(State(state): State<ChatState>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&ChatError::InvalidJson(e.to_string())),
    };

    match state.complete(request).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<ChatState>) -> Json<ModelList> {
    let created = unix_now();

    let data = state
        .inner
        .config
        .models
        .iter()
        .map(|id| Model {
            id: id.clone(),
            object: "model",
            created,
            owned_by: "parley",
        })
        .collect();

    Json(ModelList { object: "list", data })
}

/// SSE body relaying re-encoded chunks as they are decoded
///
/// An upstream failure after the headers are sent ends the body with an
/// error, so the caller sees a truncated stream without `[DONE]`.
fn stream_response(frames: FrameStream, model: String) -> Sse<impl Stream<Item = Result<Event, ChatError>>> {
    let events = reencode(frames, model).filter_map(|frame| {
        future::ready(match frame {
            Ok(ReencodedFrame::Chunk(chunk)) => match Event::default().json_data(&chunk) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping chunk that failed to serialize");
                    None
                }
            },
            Ok(ReencodedFrame::Done) => Some(Ok(Event::default().data("[DONE]"))),
            Err(e) => {
                tracing::warn!(error = %e, "upstream stream failed mid-response");
                Some(Err(ChatError::from(e)))
            }
        })
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn error_response(error: &ChatError) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = %error, error_type = error.error_type(), "chat completion failed");
    } else {
        tracing::debug!(error = %error, error_type = error.error_type(), "chat completion rejected");
    }

    (status, Json(error.error_body())).into_response()
}
