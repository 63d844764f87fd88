//! HTTP adapters - REST endpoints and the assembled application router.

pub mod chat;
mod error;

pub use chat::chat_routes;
pub use error::{ApiError, ErrorResponse};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::websocket_router;
use crate::application::SessionGateway;
use crate::config::ServerConfig;

/// Builds the full router: chat endpoints, the WebSocket endpoint and the
/// shared middleware stack.
///
/// The request timeout applies to request/response endpoints only; upgraded
/// sockets are governed by the session idle timeout.
pub fn app_router(gateway: SessionGateway, server: &ServerConfig) -> Router {
    let http = chat_routes(gateway.clone())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(server.request_timeout()));

    Router::new()
        .merge(http)
        .merge(websocket_router(gateway))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(&server.cors_origins_list())),
        )
}

/// Every origin when none are configured; otherwise exactly the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
