//! # Saorsa Canvas Server Library
//!
//! HTTP collaborators of the editor: image uploads with public URLs, export
//! download links, and server-side scene rendering.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use canvas_renderer::SceneExporter;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use url::Url;

pub mod assets;
pub mod config;
pub mod error;
pub mod fetch;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod validation;

pub use assets::{AssetError, AssetStore, FsAssetStore, MemoryAssetStore, StoredAsset};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use fetch::StoreFetcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Uploaded image storage.
    pub store: Arc<dyn AssetStore>,
    /// Offscreen renderer for `/canvas/render`.
    pub exporter: Arc<SceneExporter>,
    /// Base URL for links handed to clients, ending in `/`.
    pub public_base: Url,
    /// Client for downloading remote images.
    pub http: reqwest::Client,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create state with a default exporter and no metrics.
    #[must_use]
    pub fn new(store: Arc<dyn AssetStore>, public_base: Url) -> Self {
        Self {
            store,
            exporter: Arc::new(SceneExporter::with_defaults()),
            public_base,
            http: fetch::http_client(),
            metrics: None,
            max_body_bytes: config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Use a specific exporter.
    #[must_use]
    pub fn with_exporter(mut self, exporter: SceneExporter) -> Self {
        self.exporter = Arc::new(exporter);
        self
    }

    /// Expose metrics from `handle` at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Set the request body limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Public URL of the stored image `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be joined.
    pub fn image_url(&self, key: &str) -> Result<String, url::ParseError> {
        Ok(self.public_base.join("images/")?.join(key)?.to_string())
    }
}

/// Build a CORS layer that only allows the server's own origin and common
/// local dev servers.
fn build_cors_layer(public_base: &Url) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173", // Vite
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();
    if let Ok(own) = public_base.origin().ascii_serialization().parse() {
        origins.push(own);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(routes::metrics_handler))
        .route("/images/upload", post(routes::upload_image))
        .route("/images/{id}", get(routes::get_image))
        .route("/canvas/export", post(routes::export_canvas))
        .route("/canvas/render", post(routes::render_canvas))
        .route_layer(middleware::from_fn(metrics::track_http))
        .layer(
            ServiceBuilder::new()
                // Structured request tracing with timing
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(build_cors_layer(&state.public_base))
                .layer(DefaultBodyLimit::max(limit)),
        )
        .with_state(state)
}
