use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use parley_config::UpstreamConfig;
use reqwest::Client;
use secrecy::ExposeSecret;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use crate::error::UpstreamError;
use crate::request::UpstreamRequest;
use crate::sse::{self, UpstreamFrame};
use crate::token::TokenProvider;

const CLIENT_TIME_ZONE: &str = "client-time-zone";
const CLIENT_OPTIONS: &str = "x-cl-options";

/// Decoded upstream reply
///
/// Holds a slot of the upstream concurrency limit until dropped.
pub struct FrameStream {
    inner: Pin<Box<dyn Stream<Item = Result<UpstreamFrame, UpstreamError>> + Send>>,
    _permit: OwnedSemaphorePermit,
}

impl Stream for FrameStream {
    type Item = Result<UpstreamFrame, UpstreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// HTTP client for the upstream chat endpoint
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: Url,
    headers: HeaderMap,
    tokens: Arc<dyn TokenProvider>,
    permits: Arc<Semaphore>,
}

impl UpstreamClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::InvalidHeader` if a configured header value
    /// cannot be sent over HTTP
    pub fn new(config: &UpstreamConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(CLIENT_TIME_ZONE),
            header_value("Client-time-zone", &config.client_time_zone)?,
        );
        headers.insert(header::USER_AGENT, header_value("User-Agent", &config.user_agent)?);
        headers.insert(header::ACCEPT_LANGUAGE, header_value("Accept-Language", &config.accept_language)?);
        headers.insert(
            HeaderName::from_static(CLIENT_OPTIONS),
            header_value("X-Cl-Options", &config.client_options)?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );

        Ok(Self {
            http: Client::new(),
            base_url: config.base_url.clone(),
            headers,
            tokens,
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests)),
        })
    }

    /// Shared HTTP client, for follow-up calls such as storage lookups
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Build a URL below the upstream root
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    /// Post a payload and return its decoded reply
    ///
    /// The payload is serialized once and the credentials are computed
    /// for exactly those bytes.
    pub async fn send(&self, request: &UpstreamRequest) -> Result<FrameStream, UpstreamError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let payload = serde_json::to_string(request).map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let credentials = self.tokens.authorize(&payload).await?;

        let authorization = header_value("Authorization", credentials.authorization.expose_secret())?;
        let date = header_value("Date", &credentials.date)?;

        tracing::debug!(model = %request.model, source = ?request.source, "sending upstream request");

        let response = self
            .http
            .post(self.endpoint("chats/stream"))
            .headers(self.headers.clone())
            .header(header::DATE, date)
            .header(header::AUTHORIZATION, authorization)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "upstream request failed");
                UpstreamError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = %status, "upstream returned error");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(FrameStream {
            inner: Box::pin(sse::decode(response.bytes_stream())),
            _permit: permit,
        })
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, UpstreamError> {
    HeaderValue::from_str(value).map_err(|e| UpstreamError::InvalidHeader {
        name,
        reason: e.to_string(),
    })
}
