//! Prometheus metrics for canvas-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const HTTP_REQUESTS_TOTAL: &str = "canvas_http_requests_total";
const HTTP_REQUEST_DURATION: &str = "canvas_http_request_duration_seconds";
const UPLOADS_TOTAL: &str = "canvas_uploads_total";
const EXPORTS_TOTAL: &str = "canvas_exports_total";
const VALIDATION_FAILURES_TOTAL: &str = "canvas_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record an HTTP request.
///
/// # Arguments
///
/// * `method` - HTTP method (GET, POST, etc.)
/// * `path` - Matched route, not the raw URI
/// * `status` - HTTP status code
/// * `duration_secs` - Request duration in seconds
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// Record a stored image upload.
pub fn record_upload(content_type: &str) {
    counter!(UPLOADS_TOTAL, "content_type" => content_type.to_string()).increment(1);
}

/// Record an export.
///
/// # Arguments
///
/// * `kind` - "passthrough" for client-rendered data, "render" for server-side rendering
/// * `format` - Output format extension
pub fn record_export(kind: &'static str, format: &str) {
    counter!(
        EXPORTS_TOTAL,
        "kind" => kind,
        "format" => format.to_string()
    )
    .increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (content_type, asset_name, scene, etc.)
pub fn record_validation_failure(validation_type: &'static str) {
    counter!(VALIDATION_FAILURES_TOTAL, "type" => validation_type).increment(1);
}

/// Middleware recording request counts and latency per matched route.
pub async fn track_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    // No recorder is installed here; recording must still be a no-op rather
    // than a panic.
    #[test]
    fn test_recording_without_recorder() {
        record_http_request("GET", "/health/live", 200, 0.001);
        record_upload("image/png");
        record_export("render", "png");
        record_validation_failure("scene");
    }
}
