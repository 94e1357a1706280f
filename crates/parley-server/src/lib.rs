//! HTTP front of the gateway: routing, middleware and the listener

mod bind;
mod cors;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use parley_chat::ChatState;
use parley_config::Config;
use parley_images::ImageStore;
use parley_upstream::{TokenProvider, UpstreamClient};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use bind::bind_with_fallback;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    port_fallback: bool,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream client cannot be built or a
    /// configured duration does not parse
    pub fn new(config: &Config, tokens: Arc<dyn TokenProvider>) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(&config.upstream, tokens)?;

        let images = ImageStore::new(
            config.images.directory.clone(),
            &config.images.public_base_url,
            config.images.retention()?,
        );
        let image_dir = images.directory().to_path_buf();

        let imagegen_state = parley_imagegen::build_server(upstream.clone(), &config.imagegen)?;
        let chat_state = ChatState::new(upstream, images, config.chat.clone());

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // Chat and model listing routes
        app = app.merge(parley_chat::chat_router(chat_state));

        // Image generation routes
        app = app.merge(parley_imagegen::endpoint_router().with_state(imagegen_state));

        // Rehosted images
        app = app.nest_service("/images", ServeDir::new(&image_dir));

        // Apply middleware layers (innermost first)
        app = app.layer(TraceLayer::new_for_http());
        app = app.layer(cors::cors_layer(&config.server.cors));
        app = app.layer(axum::middleware::from_fn(cors::preflight_middleware));

        tracing::info!(
            upstream = %config.upstream.base_url,
            public_base_url = %config.images.public_base_url,
            image_dir = %image_dir.display(),
            "gateway configured"
        );

        Ok(Self {
            router: app,
            listen_address: config.server.listen_address(),
            port_fallback: config.server.port_fallback,
        })
    }

    /// Get the preferred listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if no port can be bound or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = bind_with_fallback(self.listen_address, self.port_fallback).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
