//! Router construction and the listening loop

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::Method, routing::get, Router};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::cache::ProjectCache;
use crate::cli::AppConfig;
use crate::handlers::{self, X_CACHE};

/// Builds the application router around a shared cache
pub fn build_app(cache: Arc<ProjectCache>, config: &AppConfig) -> Router {
    Router::new()
        .route("/api/projects", get(handlers::list_projects))
        .with_state(cache)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins
///
/// Credentials are allowed, so request headers are mirrored rather than
/// answered with a wildcard.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([X_CACHE])
}

/// Binds `addr` and serves `app` until Ctrl+C
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
