//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use canvas_core::CanvasError;
use canvas_renderer::RenderError;
use serde::Serialize;
use thiserror::Error;

use crate::assets::AssetError;
use crate::metrics;
use crate::validation::ValidationError;

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload content type is not an image type.
    #[error("{0}")]
    InvalidContentType(String),

    /// A request field failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Storage or rendering failed on the server side.
    #[error("{0}")]
    Internal(String),
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidContentType(_) | Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidContentType(_) => "invalid_content_type",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        metrics::record_validation_failure(err.kind());
        match err {
            ValidationError::NotAnImage(_) => Self::InvalidContentType(err.to_string()),
            _ => Self::InvalidArgument(err.to_string()),
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::NotFound(_) => Self::NotFound(err.to_string()),
            AssetError::InvalidKey(inner) => inner.into(),
            AssetError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::EmptyScene => Self::InvalidArgument(err.to_string()),
            RenderError::Resource(_) | RenderError::Frame(_) | RenderError::Export(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<CanvasError> for ApiError {
    fn from(err: CanvasError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
