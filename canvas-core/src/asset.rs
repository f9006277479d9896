//! Files handed back by the host's file picker.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{CanvasError, CanvasResult};

/// Raw bytes of a file the user picked for the image tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    /// File contents.
    pub bytes: Vec<u8>,
    /// File name as shown to the user.
    pub filename: String,
    /// MIME type reported by the picker.
    pub content_type: String,
}

impl PickedFile {
    /// Create a picked file.
    #[must_use]
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Whether the reported MIME type is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        is_image_content_type(&self.content_type)
    }

    /// Convert to an image `src` data URL and its alt text (the filename).
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] if the file is not an image.
    pub fn into_image_source(self) -> CanvasResult<(String, String)> {
        if !self.is_image() {
            return Err(CanvasError::InvalidOperation(format!(
                "{} is not an image ({})",
                self.filename, self.content_type
            )));
        }
        let src = data_url(&self.content_type, &self.bytes);
        Ok((src, self.filename))
    }
}

/// Whether `content_type` names an image MIME type.
#[must_use]
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Encode bytes as a base64 `data:` URL.
#[must_use]
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
