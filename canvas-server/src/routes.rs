//! API route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use canvas_core::{data_url, CanvasElement, Scene};
use canvas_renderer::{AssetCache, ExportFormat, ImageLoader};
use serde::{Deserialize, Serialize};

use crate::assets::{current_timestamp, object_key, StoredAsset};
use crate::error::{ApiError, ApiResult};
use crate::fetch::StoreFetcher;
use crate::metrics;
use crate::validation::{
    validate_asset_name, validate_filename, validate_image_content_type, validate_object_key,
    validate_scene,
};
use crate::AppState;

/// Body of `POST /images/upload`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    /// Client-supplied image name.
    pub name: String,
    /// Base64 image data, optionally with a `data:<mime>;base64,` prefix.
    pub data: String,
    /// MIME type; must be `image/*`.
    pub content_type: String,
}

/// Response of `POST /images/upload`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadImageResponse {
    /// Public URL of the stored image.
    pub url: String,
    /// Object key.
    pub id: String,
}

/// Body of `POST /canvas/export`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCanvasRequest {
    /// Base64 encoded image the client already rendered.
    pub canvas_data: String,
    /// `png` or `jpg`.
    pub format: String,
    /// Download name without extension.
    pub filename: String,
}

/// Response of `POST /canvas/export`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCanvasResponse {
    /// `data:` URL of the exported image.
    pub download_url: String,
}

/// Body of `POST /canvas/render`.
#[derive(Debug, Deserialize)]
pub struct RenderCanvasRequest {
    /// Scene elements, bottom to top.
    pub elements: Vec<CanvasElement>,
    /// `png` or `jpg`.
    pub format: String,
    /// Download name without extension.
    pub filename: String,
}

/// Response of `POST /canvas/render`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCanvasResponse {
    /// `data:` URL of the rendered image.
    pub download_url: String,
    /// Download name including extension.
    pub filename: String,
}

/// Strip an optional `data:<mime>;base64,` prefix.
fn strip_data_url_prefix(data: &str) -> &str {
    match data.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => data,
    }
}

fn parse_format(format: &str) -> ApiResult<ExportFormat> {
    format
        .parse()
        .map_err(|_| ApiError::InvalidArgument(format!("Unsupported format: {format}")))
}

/// Store an uploaded image and return its public URL.
#[tracing::instrument(name = "upload_image", skip(state, request), fields(name = %request.name))]
pub async fn upload_image(
    State(state): State<AppState>,
    Json(request): Json<UploadImageRequest>,
) -> ApiResult<Json<UploadImageResponse>> {
    let subtype = validate_image_content_type(&request.content_type)?;
    validate_asset_name(&request.name)?;

    let bytes = STANDARD
        .decode(strip_data_url_prefix(&request.data).trim())
        .map_err(|e| ApiError::InvalidArgument(format!("Invalid base64 image data: {e}")))?;

    let key = object_key(current_timestamp(), &request.name, subtype);
    state
        .store
        .put(
            &key,
            StoredAsset {
                bytes,
                content_type: request.content_type.clone(),
            },
        )
        .await?;

    let url = state
        .image_url(&key)
        .map_err(|e| ApiError::Internal(format!("Failed to build image URL: {e}")))?;
    metrics::record_upload(&request.content_type);
    tracing::info!("Stored image {key}");

    Ok(Json(UploadImageResponse { url, id: key }))
}

/// Serve a stored image.
#[tracing::instrument(name = "get_image", skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    validate_object_key(&id)?;
    let asset = state.store.get(&id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        Bytes::from(asset.bytes),
    ))
}

/// Wrap client-rendered image data in a download URL.
#[tracing::instrument(name = "export_canvas", skip(request), fields(format = %request.format))]
pub async fn export_canvas(
    Json(request): Json<ExportCanvasRequest>,
) -> ApiResult<Json<ExportCanvasResponse>> {
    let format = parse_format(&request.format)?;
    validate_filename(&request.filename)?;
    metrics::record_export("passthrough", format.extension());

    Ok(Json(ExportCanvasResponse {
        download_url: format!("data:{};base64,{}", format.mime(), request.canvas_data),
    }))
}

/// Render a scene on the server and return the encoded image.
#[tracing::instrument(
    name = "render_canvas",
    skip(state, request),
    fields(format = %request.format, elements = request.elements.len())
)]
pub async fn render_canvas(
    State(state): State<AppState>,
    Json(request): Json<RenderCanvasRequest>,
) -> ApiResult<Json<RenderCanvasResponse>> {
    let format = parse_format(&request.format)?;
    validate_filename(&request.filename)?;
    validate_scene(&request.elements)?;
    let scene = Scene::from_elements(request.elements)?;

    // Fresh cache per request so a failed image is retried next time.
    let fetcher = StoreFetcher::new(
        Arc::clone(&state.store),
        &state.public_base,
        state.http.clone(),
        state.max_body_bytes,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    let (loader, _redraws) = ImageLoader::new(Arc::new(AssetCache::new()), Arc::new(fetcher))?;

    let bytes = state
        .exporter
        .export_loading(scene.elements(), format, &loader)
        .await?;
    metrics::record_export("render", format.extension());

    Ok(Json(RenderCanvasResponse {
        download_url: data_url(format.mime(), &bytes),
        filename: format.file_name(&request.filename),
    }))
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(state))]
pub async fn metrics_handler(State(state): State<AppState>) -> ApiResult<String> {
    state
        .metrics
        .as_ref()
        .map(metrics_exporter_prometheus::PrometheusHandle::render)
        .ok_or_else(|| ApiError::NotFound("metrics are not enabled".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_data_url_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("x;base64,AAAA"), "x;base64,AAAA");
    }

    #[test]
    fn test_request_wire_names() {
        let request: UploadImageRequest = serde_json::from_str(
            r#"{"name":"logo","data":"AAAA","contentType":"image/png"}"#,
        )
        .expect("deserialize");
        assert_eq!(request.content_type, "image/png");

        let json = serde_json::to_string(&ExportCanvasResponse {
            download_url: "data:image/png;base64,AAAA".into(),
        })
        .expect("serialize");
        assert!(json.contains("downloadUrl"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("jpg").ok(), Some(ExportFormat::Jpeg));
        assert!(matches!(parse_format("gif"), Err(ApiError::InvalidArgument(_))));
    }
}
