//! Image decoding for image elements.
//!
//! Supports raw bytes and base64 or percent-encoded data URIs. Decoded images
//! are normalized into an [`ImageAsset`]: a data URI in a format the
//! rasterizer can embed, plus the pixel dimensions.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{RenderError, RenderResult};

/// A decoded image, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Format of `data_uri`.
    pub format: ImageFormat,
    /// Self-contained `data:` URI of the image.
    pub data_uri: String,
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF (first frame).
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF: GIF8
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// MIME type, if known.
    #[must_use]
    pub fn mime(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::Gif => Some("image/gif"),
            Self::WebP => Some("image/webp"),
            Self::Unknown => None,
        }
    }

    /// Whether the rasterizer can embed this format as-is.
    #[must_use]
    pub fn is_embeddable(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Gif)
    }
}

/// Decode an image from raw bytes.
///
/// Formats the rasterizer cannot embed directly are re-encoded as PNG.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn decode_image(data: &[u8]) -> RenderResult<ImageAsset> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    let (width, height) = (img.width(), img.height());

    let (format, bytes) = if format.is_embeddable() {
        (format, data.to_vec())
    } else {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| RenderError::Resource(format!("Failed to re-encode image: {e}")))?;
        (ImageFormat::Png, buf.into_inner())
    };

    let mime = format.mime().unwrap_or("image/png");
    Ok(ImageAsset {
        width,
        height,
        format,
        data_uri: format!("data:{mime};base64,{}", STANDARD.encode(&bytes)),
    })
}

/// Split a data URI into its declared MIME type and decoded payload.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<(Option<String>, Vec<u8>)> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let is_base64 = metadata.contains(";base64");
    let mime = metadata
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let bytes = if is_base64 {
        STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    Ok((mime, bytes))
}

/// Decode an image from a data URI.
///
/// # Errors
///
/// Returns an error if the data URI is malformed or the image cannot be decoded.
pub fn decode_data_uri(uri: &str) -> RenderResult<ImageAsset> {
    let (_, bytes) = parse_data_uri(uri)?;
    decode_image(&bytes)
}

/// Simple URL decoding (percent-encoding).
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 PNG
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_format_detection_from_mime() {
        assert_eq!(ImageFormat::from_mime("image/png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_mime("IMAGE/JPEG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_mime("image/gif"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_mime("image/webp"), ImageFormat::WebP);
        assert_eq!(ImageFormat::from_mime("text/plain"), ImageFormat::Unknown);
    }

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"BM"), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_decoding() {
        let asset = decode_data_uri(&format!("data:image/png;base64,{PNG_BASE64}"))
            .expect("valid data URI");
        assert_eq!((asset.width, asset.height), (1, 1));
        assert_eq!(asset.format, ImageFormat::Png);
        assert!(asset.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_unembeddable_format_is_reencoded() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 255, 0, 255]));
        let mut bmp = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut bmp, image::ImageFormat::Bmp)
            .expect("encode bmp");

        let asset = decode_image(bmp.get_ref()).expect("decode bmp");
        assert_eq!(asset.format, ImageFormat::Png);
        assert_eq!((asset.width, asset.height), (3, 2));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(decode_data_uri("not a data uri").is_err());
        assert!(decode_data_uri("data:image/png").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn test_percent_encoded_payload() {
        let (mime, bytes) = parse_data_uri("data:text/plain,a%20b%2Cc").expect("parse");
        assert_eq!(mime.as_deref(), Some("text/plain"));
        assert_eq!(bytes, b"a b,c");
        assert!(parse_data_uri("data:,%zz").is_err());
    }
}
