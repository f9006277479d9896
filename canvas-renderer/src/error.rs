//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Rendering frame failed.
    #[error("Frame render failed: {0}")]
    Frame(String),

    /// Encoding an exported frame failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Export was requested for a scene with no elements.
    #[error("Nothing to export: the scene is empty")]
    EmptyScene,
}
