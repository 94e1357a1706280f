use parley_config::ImageGenConfig;
use parley_core::unix_now;
use parley_upstream::{Transcript, UpstreamClient, UpstreamRequest};

use crate::error::{ImageGenError, Result};
use crate::resolver::{Resolver, extract_image_link};
use crate::types::{ImageData, ImageRequest, ImageResponse, ResponseFormat};

/// Image generation server drawing through the upstream chat API
pub struct Server {
    upstream: UpstreamClient,
    resolver: Resolver,
    config: ImageGenConfig,
}

impl Server {
    /// Draw one image for the request's prompt
    ///
    /// The upstream reply is drained completely before the image link in it
    /// is resolved. Nothing is retried.
    pub async fn generate(&self, request: &ImageRequest) -> Result<ImageResponse> {
        let prompt = request.prompt()?;
        let payload = UpstreamRequest::image_generation(prompt, &self.config);

        let frames = self.upstream.send(&payload).await?;
        let transcript = Transcript::collect(frames).await?;

        if transcript.text.trim().is_empty() {
            tracing::warn!("upstream drawing reply was empty");
            return Err(ImageGenError::Resolution("no image markdown in upstream reply".to_owned()));
        }

        let link = extract_image_link(&transcript.text).ok_or_else(|| {
            tracing::warn!(reply = %transcript.text, "upstream drawing reply has no image");
            ImageGenError::Resolution("no image link in upstream reply".to_owned())
        })?;

        let url = match self.resolver.storage_key(link) {
            Some(key) => {
                let storage_url = self.upstream.endpoint(&format!("storage/{key}"));
                self.resolver.lookup(&storage_url).await?
            }
            None => link.to_owned(),
        };

        tracing::debug!(url = %url, "image generated");

        let data = match request.response_format() {
            ResponseFormat::B64Json => ImageData::b64_json(self.resolver.download_base64(&url).await?),
            ResponseFormat::Url => ImageData::url(url),
        };

        Ok(ImageResponse {
            created: unix_now(),
            data: vec![data],
        })
    }
}

/// Builder for constructing the image generation server from configuration
pub struct ImageGenServerBuilder<'a> {
    upstream: UpstreamClient,
    config: &'a ImageGenConfig,
}

impl<'a> ImageGenServerBuilder<'a> {
    pub fn new(upstream: UpstreamClient, config: &'a ImageGenConfig) -> Self {
        Self { upstream, config }
    }

    pub fn build(self) -> anyhow::Result<Server> {
        let storage_timeout = self.config.storage_timeout()?;
        let download_timeout = self.config.download_timeout()?;

        tracing::debug!(
            model = %self.config.model,
            ?storage_timeout,
            ?download_timeout,
            "image generation server initialized"
        );

        let resolver = Resolver::new(
            self.upstream.http().clone(),
            self.config.internal_prefix.clone(),
            storage_timeout,
            download_timeout,
        );

        Ok(Server {
            upstream: self.upstream,
            resolver,
            config: self.config.clone(),
        })
    }
}
