//! Input validation for untrusted data.
//!
//! Upload names, object keys and submitted scenes come straight from
//! clients and are checked here before they reach storage or the renderer.

use canvas_core::{CanvasElement, ElementKind};
use thiserror::Error;

/// Maximum length for an uploaded image's name.
pub const MAX_ASSET_NAME_LEN: usize = 128;
/// Maximum length for a stored object key.
pub const MAX_OBJECT_KEY_LEN: usize = 256;
/// Maximum length for an export filename.
pub const MAX_FILENAME_LEN: usize = 128;
/// Maximum text content length in elements.
pub const MAX_TEXT_CONTENT_LEN: usize = 1_048_576; // 1MB
/// Maximum elements per rendered scene.
pub const MAX_ELEMENTS_PER_SCENE: usize = 10_000;

/// Validation error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Content type is not an image type.
    #[error("Only image files are allowed (got {0:?})")]
    NotAnImage(String),
    /// Asset name is empty or exceeds maximum length.
    #[error("image name must be 1-{MAX_ASSET_NAME_LEN} characters")]
    NameLength,
    /// Asset name contains path separators or control characters.
    #[error("image name contains invalid characters")]
    NameInvalidChars,
    /// Object key is malformed.
    #[error("invalid image id")]
    InvalidObjectKey,
    /// Export filename is empty, too long or contains path separators.
    #[error("invalid export filename")]
    InvalidFilename,
    /// Text content exceeds maximum length.
    #[error("text content too long (max {MAX_TEXT_CONTENT_LEN} bytes)")]
    TextContentTooLong,
    /// Too many elements in scene.
    #[error("too many elements (max {MAX_ELEMENTS_PER_SCENE})")]
    TooManyElements,
    /// Non-finite position, size, rotation or opacity.
    #[error("invalid transform: {0}")]
    InvalidTransform(String),
}

impl ValidationError {
    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAnImage(_) => "content_type",
            Self::NameLength | Self::NameInvalidChars => "asset_name",
            Self::InvalidObjectKey => "object_key",
            Self::InvalidFilename => "filename",
            Self::TextContentTooLong | Self::TooManyElements | Self::InvalidTransform(_) => {
                "scene"
            }
        }
    }
}

/// Check if a character may appear in an object key.
fn is_valid_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn has_path_syntax(s: &str) -> bool {
    s.contains(['/', '\\']) || s.chars().any(char::is_control)
}

/// Validate an upload content type and return its subtype
/// (`image/png` gives `png`).
///
/// # Errors
///
/// Returns [`ValidationError::NotAnImage`] unless the type is `image/<subtype>`.
pub fn validate_image_content_type(content_type: &str) -> Result<&str, ValidationError> {
    if !canvas_core::is_image_content_type(content_type) {
        return Err(ValidationError::NotAnImage(content_type.to_string()));
    }
    match content_type.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => Ok(subtype),
        _ => Err(ValidationError::NotAnImage(content_type.to_string())),
    }
}

/// Validate an uploaded image's name.
///
/// Valid names:
/// - 1-128 characters
/// - No path separators or control characters
///
/// # Errors
///
/// Returns [`ValidationError::NameLength`] or [`ValidationError::NameInvalidChars`].
pub fn validate_asset_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.chars().count() > MAX_ASSET_NAME_LEN {
        return Err(ValidationError::NameLength);
    }
    if has_path_syntax(name) {
        return Err(ValidationError::NameInvalidChars);
    }
    Ok(())
}

/// Validate a stored object key taken from a request path.
///
/// Valid keys:
/// - 1-256 characters
/// - ASCII alphanumeric, hyphen, underscore, dot only
/// - No leading dot and no `..`
///
/// # Errors
///
/// Returns [`ValidationError::InvalidObjectKey`] otherwise.
pub fn validate_object_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty()
        || key.len() > MAX_OBJECT_KEY_LEN
        || key.starts_with('.')
        || key.contains("..")
        || !key.chars().all(is_valid_key_char)
    {
        return Err(ValidationError::InvalidObjectKey);
    }
    Ok(())
}

/// Validate an export filename stem.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFilename`] if it is empty, longer than
/// 128 characters, or contains path syntax.
pub fn validate_filename(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || name.chars().count() > MAX_FILENAME_LEN || has_path_syntax(name) {
        return Err(ValidationError::InvalidFilename);
    }
    Ok(())
}

/// Validate text content length.
///
/// # Errors
///
/// Returns [`ValidationError::TextContentTooLong`] if the text exceeds 1MB.
pub fn validate_text_content(text: &str) -> Result<(), ValidationError> {
    if text.len() > MAX_TEXT_CONTENT_LEN {
        return Err(ValidationError::TextContentTooLong);
    }
    Ok(())
}

/// Validate a scene submitted for rendering.
///
/// # Errors
///
/// Returns the first problem found: too many elements, oversized text, or a
/// non-finite geometry value.
pub fn validate_scene(elements: &[CanvasElement]) -> Result<(), ValidationError> {
    if elements.len() > MAX_ELEMENTS_PER_SCENE {
        return Err(ValidationError::TooManyElements);
    }
    for element in elements {
        let values = [
            element.position.x,
            element.position.y,
            element.size.width,
            element.size.height,
            element.rotation,
            element.opacity,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            return Err(ValidationError::InvalidTransform(element.id.to_string()));
        }
        if let ElementKind::Text(text) = &element.kind {
            validate_text_content(&text.content)?;
        }
    }
    Ok(())
}
