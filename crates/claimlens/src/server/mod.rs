//! Axum web server for the upload UI and the analysis API.

pub mod error;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use claimlens_core::{Analyzer, Config};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

/// Headroom on top of the image size limit for multipart boundaries and
/// the non-file form fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the application router.
///
/// `max_upload_bytes` is the accepted image size; the request body limit
/// sits slightly above it so the multipart framing never trips the limit
/// before intake can report the oversize image itself.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/report", get(routes::report_page))
        .route("/analyze", post(routes::analyze))
        .route("/api/health", get(routes::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server until the process is terminated.
///
/// Provider setup happens before the port is bound, so a deployment with
/// no usable API key fails here instead of 400ing every upload.
pub async fn run_server(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let analyzer = Analyzer::new(config)?;
    let engines: Vec<String> = analyzer
        .engines()
        .iter()
        .map(|e| e.to_string())
        .collect();

    let state = AppState {
        analyzer: Arc::new(analyzer),
    };
    let max_upload_bytes = (config.limits.max_upload_mb as usize) * 1024 * 1024;
    let app = create_router(state, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!(
        "ClaimLens listening on http://{host}:{port} (engines: {})",
        engines.join(", ")
    );

    axum::serve(listener, app).await?;
    Ok(())
}
