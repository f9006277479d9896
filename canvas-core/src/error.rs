//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Element not found in scene.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Two elements share the same ID.
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),

    /// Invalid element operation.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// A property edit named an unknown field or carried an invalid value.
    #[error("Invalid property {field}: {reason}")]
    InvalidProperty {
        /// Field name as sent by the properties surface.
        field: String,
        /// Why the edit was rejected.
        reason: String,
    },

    /// Scene serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
