//! Axum HTTP routes for the metrics endpoint.

use crate::error::ServerError;
use crate::exposition::CONTENT_TYPE;
use crate::registry::MetricsRegistry;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

pub fn build_router(registry: MetricsRegistry) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(registry)
}

async fn index() -> Html<&'static str> {
    Html(
        "<html><head><title>dirsize exporter</title></head>\
         <body><h1>dirsize exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body></html>",
    )
}

async fn metrics(State(registry): State<MetricsRegistry>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], registry.render())
}

async fn health() -> &'static str {
    "ok"
}

/// Serve the metrics endpoint on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    registry: MetricsRegistry,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!("Serving metrics on http://{addr}/metrics");

    axum::serve(listener, build_router(registry))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
