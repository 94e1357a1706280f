use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::header::HeaderName;
use http::{Method, StatusCode};
use parley_config::{AnyOrArray, CorsConfig};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    // Origins
    layer = match &config.origins {
        AnyOrArray::Any => layer.allow_origin(AllowOrigin::any()),
        AnyOrArray::List(origins) => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            layer.allow_origin(origins)
        }
    };

    // Methods
    layer = match &config.methods {
        AnyOrArray::Any => layer.allow_methods(AllowMethods::any()),
        AnyOrArray::List(methods) => {
            let methods: Vec<Method> = methods.iter().filter_map(|m| m.parse().ok()).collect();
            layer.allow_methods(methods)
        }
    };

    // Headers
    layer = match &config.headers {
        AnyOrArray::Any => layer.allow_headers(AllowHeaders::any()),
        AnyOrArray::List(headers) => {
            let headers: Vec<HeaderName> = headers.iter().filter_map(|h| h.parse().ok()).collect();
            layer.allow_headers(headers)
        }
    };

    if let Some(duration) = config.max_age_duration() {
        layer = layer.max_age(duration);
    }

    layer
}

/// Answer every `OPTIONS` request with an empty 204
///
/// Runs outside the CORS layer so the preflight headers it adds are kept.
pub async fn preflight_middleware(req: Request, next: Next) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }

    let (mut parts, _) = next.run(req).await.into_parts();
    parts.status = StatusCode::NO_CONTENT;
    parts.headers.remove(http::header::CONTENT_LENGTH);
    parts.headers.remove(http::header::CONTENT_TYPE);

    Response::from_parts(parts, Body::empty())
}
