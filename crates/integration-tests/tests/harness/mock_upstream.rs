//! Mock upstream server for integration tests
//!
//! Answers `/chats/stream` with a canned SSE reply, resolves storage keys
//! under `/storage/{key}` and serves the resolved files under `/files/{name}`.
//! A gated mock holds back everything after its first event until released.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Bytes served for every file under `/files/`
pub const FILE_BYTES: &[u8] = b"fake-png";

/// Mock upstream that returns predictable replies
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

/// A `/chats/stream` call as the mock saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub body: Value,
    pub headers: HeaderMap,
}

struct MockState {
    /// SSE `data:` payloads sent before `[DONE]`
    events: Vec<String>,
    /// Status to answer `/chats/stream` with instead of a reply
    status: Option<StatusCode>,
    /// When set, events after the first wait for this to be notified
    gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<RecordedRequest>>,
    self_url: Mutex<String>,
}

impl MockUpstream {
    /// Start a mock replying "Hello from upstream" in two deltas
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with_events(vec![text_event("Hello "), text_event("from upstream")]).await
    }

    /// Start a mock replying with the given events, then `[DONE]`
    pub async fn start_with_events(events: Vec<String>) -> anyhow::Result<Self> {
        Self::start_inner(events, None, None).await
    }

    /// Start a mock that sends `first`, then stalls until the returned
    /// handle is notified before sending `rest` and `[DONE]`
    pub async fn start_gated(first: String, rest: Vec<String>) -> anyhow::Result<(Self, Arc<Notify>)> {
        let gate = Arc::new(Notify::new());
        let mut events = vec![first];
        events.extend(rest);
        let mock = Self::start_inner(events, None, Some(Arc::clone(&gate))).await?;
        Ok((mock, gate))
    }

    /// Start a mock answering every chat call with `status`
    pub async fn start_failing(status: u16) -> anyhow::Result<Self> {
        Self::start_inner(Vec::new(), Some(StatusCode::from_u16(status)?), None).await
    }

    async fn start_inner(
        events: Vec<String>,
        status: Option<StatusCode>,
        gate: Option<Arc<Notify>>,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            events,
            status,
            gate,
            requests: Mutex::new(Vec::new()),
            self_url: Mutex::new(String::new()),
        });

        let app = Router::new()
            .route("/chats/stream", routing::post(handle_chat))
            .route("/storage/{key}", routing::get(handle_storage))
            .route("/files/{name}", routing::get(handle_file))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        *state.self_url.lock().expect("lock") = format!("http://{addr}");

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as the upstream
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every `/chats/stream` call received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("lock").clone()
    }

    /// The most recent `/chats/stream` payload
    pub fn last_body(&self) -> Value {
        self.requests().last().expect("at least one upstream call").body.clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// SSE payload carrying one text delta
pub fn text_event(content: &str) -> String {
    json!({"model": "claude-3-5-sonnet", "choices": [{"delta": {"content": content}}]}).to_string()
}

/// SSE payload carrying one image delta
pub fn image_event(url: &str) -> String {
    json!({"choices": [{"delta": {"images": [{"data": url}]}}]}).to_string()
}

async fn handle_chat(State(state): State<Arc<MockState>>, headers: HeaderMap, body: String) -> Response {
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.requests.lock().expect("lock").push(RecordedRequest { body, headers });

    if let Some(status) = state.status {
        return status.into_response();
    }

    if let Some(gate) = &state.gate {
        return gated_reply(&state.events, Arc::clone(gate));
    }

    let mut reply = String::new();
    for event in &state.events {
        reply.push_str("data: ");
        reply.push_str(event);
        reply.push_str("\n\n");
    }
    reply.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], reply).into_response()
}

/// Single-newline framed reply whose tail waits on `gate`
fn gated_reply(events: &[String], gate: Arc<Notify>) -> Response {
    let (head, tail) = events.split_first().map_or((String::new(), &[][..]), |(first, rest)| {
        (format!("data: {first}\n"), rest)
    });
    let mut rest: String = tail.iter().map(|event| format!("data: {event}\n")).collect();
    rest.push_str("data: [DONE]\n");

    let chunks = stream::once(async move { Ok::<_, Infallible>(head) }).chain(stream::once(async move {
        gate.notified().await;
        Ok(rest)
    }));

    ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(chunks)).into_response()
}

async fn handle_storage(State(state): State<Arc<MockState>>, Path(key): Path<String>) -> Json<Value> {
    let base = state.self_url.lock().expect("lock").clone();
    Json(json!({"getUrl": format!("{base}/files/{key}.png")}))
}

async fn handle_file(Path(_name): Path<String>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], FILE_BYTES)
}
