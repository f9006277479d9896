//! Offscreen scene export to PNG and JPEG.
//!
//! Export renders through the same [`Renderer`] as the live view, on a fixed
//! surface at zoom 1 with no selection outline, so the pixels match what the
//! editor shows for the same scene.

use std::fmt;
use std::str::FromStr;

use canvas_core::{CanvasElement, ElementKind, Size};
use image::ImageEncoder;

use crate::asset_cache::AssetCache;
use crate::error::{RenderError, RenderResult};
use crate::loader::ImageLoader;
use crate::render::{Frame, Renderer, RendererConfig};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
}

impl ExportFormat {
    /// MIME type of the encoded output.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Download name for an export called `stem`.
    #[must_use]
    pub fn file_name(self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(RenderError::Export(format!("Unsupported format: {other}"))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Configuration for scene export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Opaque background color as RGB bytes.
    pub background: [u8; 3],
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
    /// Load the host's installed fonts for text elements.
    pub load_system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: [255, 255, 255],
            jpeg_quality: 90,
            load_system_fonts: true,
        }
    }
}

/// Exports a scene to encoded image bytes.
pub struct SceneExporter {
    config: ExportConfig,
    renderer: Renderer,
}

impl SceneExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let [r, g, b] = config.background;
        let renderer = Renderer::new(RendererConfig {
            background: Some(format!("#{r:02x}{g:02x}{b:02x}")),
            load_system_fonts: config.load_system_fonts,
            ..RendererConfig::default()
        });
        Self { config, renderer }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Get the export configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export `elements` using whatever images are already ready in `assets`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyScene`] for an empty scene, or an error if
    /// rendering or encoding fails.
    pub fn export(
        &self,
        elements: &[CanvasElement],
        format: ExportFormat,
        assets: &AssetCache,
    ) -> RenderResult<Vec<u8>> {
        if elements.is_empty() {
            return Err(RenderError::EmptyScene);
        }
        let pixmap = self.render(elements, assets)?;
        let bytes = match format {
            ExportFormat::Png => pixmap
                .encode_png()
                .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?,
            ExportFormat::Jpeg => self.encode_jpeg(&pixmap)?,
        };
        tracing::debug!(
            "Exported {} elements as {format} ({} bytes)",
            elements.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Load every image element in scene order, one at a time, then export.
    ///
    /// A failed image does not abort the export; it is left out of the output.
    ///
    /// # Errors
    ///
    /// Same as [`SceneExporter::export`].
    pub async fn export_loading(
        &self,
        elements: &[CanvasElement],
        format: ExportFormat,
        loader: &ImageLoader,
    ) -> RenderResult<Vec<u8>> {
        if elements.is_empty() {
            return Err(RenderError::EmptyScene);
        }
        for element in elements {
            if let ElementKind::Image(image) = &element.kind {
                if let Err(e) = loader.load(&image.src).await {
                    tracing::debug!("Exporting without image {}: {e}", element.id);
                }
            }
        }
        self.export(elements, format, loader.cache())
    }

    /// Render `elements` to the export surface without encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    #[allow(clippy::cast_precision_loss)]
    pub fn render(
        &self,
        elements: &[CanvasElement],
        assets: &AssetCache,
    ) -> RenderResult<tiny_skia::Pixmap> {
        let size = Size::new(self.config.width as f32, self.config.height as f32);
        self.renderer.render(&Frame::new(elements, size), assets)
    }

    /// Flatten onto the background and encode as JPEG.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn encode_jpeg(&self, pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = self.config.background;
        let mut rgb_data = Vec::with_capacity(width as usize * height as usize * 3);
        // Pixmap data is premultiplied.
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for channel in 0..3 {
                let value = f32::from(bg[channel]).mul_add(inv, f32::from(pixel[channel]));
                rgb_data.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }
}

impl Default for SceneExporter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
