//! Deterministic scene rasterization.
//!
//! A frame is composed as SVG and rasterized with resvg into a tiny-skia
//! pixmap. The same inputs always produce the same pixels; the on-screen
//! path and export both go through [`Renderer::render`].

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use canvas_core::element::{ImageProps, Paint, ShapeProps, ShapeType, TextAlign, TextProps};
use canvas_core::{element_transform, CanvasElement, EditorState, ElementId, ElementKind, Size};

use crate::asset_cache::AssetCache;
use crate::error::{RenderError, RenderResult};

/// Accent color of the selection outline.
pub const SELECTION_ACCENT: &str = "#3b82f6";

/// Configuration for the renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Surface fill drawn before any element; `None` leaves it transparent.
    pub background: Option<String>,
    /// Selection outline color.
    pub accent_color: String,
    /// Load the host's installed fonts for text elements.
    pub load_system_fonts: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            background: Some("#ffffff".to_string()),
            accent_color: SELECTION_ACCENT.to_string(),
            load_system_fonts: true,
        }
    }
}

/// Everything one frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Elements bottom to top.
    pub elements: &'a [CanvasElement],
    /// Element to outline, if any.
    pub selection: Option<&'a ElementId>,
    /// Logical canvas dimensions.
    pub canvas_size: Size,
    /// Zoom factor; the surface is `canvas_size × zoom` pixels.
    pub zoom: f32,
}

impl<'a> Frame<'a> {
    /// A frame at zoom 1 with no selection.
    #[must_use]
    pub fn new(elements: &'a [CanvasElement], canvas_size: Size) -> Self {
        Self {
            elements,
            selection: None,
            canvas_size,
            zoom: 1.0,
        }
    }

    /// The frame the editor currently shows.
    ///
    /// The pan offset is a display-time translation and is not part of it.
    #[must_use]
    pub fn from_editor(editor: &'a EditorState) -> Self {
        Self {
            elements: editor.scene().elements(),
            selection: editor.selection(),
            canvas_size: editor.viewport().canvas_size,
            zoom: editor.viewport().zoom,
        }
    }

    /// Outline `selection`.
    #[must_use]
    pub fn with_selection(mut self, selection: Option<&'a ElementId>) -> Self {
        self.selection = selection;
        self
    }

    /// Set the zoom factor.
    #[must_use]
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Surface size in whole pixels, at least 1×1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.canvas_size.width * self.zoom).round().max(1.0) as u32;
        let h = (self.canvas_size.height * self.zoom).round().max(1.0) as u32;
        (w, h)
    }
}

/// The scene renderer.
pub struct Renderer {
    config: RendererConfig,
    options: usvg::Options<'static>,
    frame_count: AtomicU64,
}

impl Renderer {
    /// Create a new renderer with the given configuration.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        let mut options = usvg::Options::default();
        if config.load_system_fonts {
            options.fontdb_mut().load_system_fonts();
            tracing::debug!("Loaded {} font faces", options.fontdb.len());
        }
        Self {
            config,
            options,
            frame_count: AtomicU64::new(0),
        }
    }

    /// Get the renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Get the number of frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Render a frame to pixels.
    ///
    /// Image elements whose asset is not ready in `assets` are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the composed frame cannot be parsed or the surface
    /// cannot be allocated.
    pub fn render(&self, frame: &Frame<'_>, assets: &AssetCache) -> RenderResult<tiny_skia::Pixmap> {
        if !(frame.zoom.is_finite() && frame.zoom > 0.0) {
            return Err(RenderError::Frame(format!("invalid zoom {}", frame.zoom)));
        }
        let svg = self.compose_svg(frame, assets);
        let tree = usvg::Tree::from_str(&svg, &self.options)
            .map_err(|e| RenderError::Frame(format!("SVG parsing failed: {e}")))?;

        let (w, h) = frame.pixel_size();
        let mut pixmap = tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| RenderError::Frame(format!("Failed to create {w}x{h} pixmap")))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let n = self.frame_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("Rendered frame {n}: {} elements at {w}x{h}", frame.elements.len());
        Ok(pixmap)
    }

    /// Compose the SVG document for a frame.
    #[must_use]
    pub fn compose_svg(&self, frame: &Frame<'_>, assets: &AssetCache) -> String {
        let Size { width, height } = frame.canvas_size;
        let (px_w, px_h) = frame.pixel_size();

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{px_w}\" height=\"{px_h}\" viewBox=\"0 0 {width} {height}\" preserveAspectRatio=\"none\">",
        );

        if let Some(background) = &self.config.background {
            let _ = write!(
                svg,
                "<rect width=\"{width}\" height=\"{height}\" fill=\"{}\"/>",
                escape_xml(background),
            );
        }

        for element in frame.elements {
            write_element(&mut svg, element, assets);
            if frame.selection == Some(&element.id) {
                self.write_selection(&mut svg, element, frame.zoom);
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Dashed outline around the un-rotated box, kept visually constant
    /// across zoom levels.
    fn write_selection(&self, svg: &mut String, element: &CanvasElement, zoom: f32) {
        let inset = 2.0 / zoom;
        let dash = 5.0 / zoom;
        let _ = write!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" \
             stroke-width=\"{}\" stroke-dasharray=\"{dash} {dash}\"/>",
            element.position.x - inset,
            element.position.y - inset,
            element.size.width + 2.0 * inset,
            element.size.height + 2.0 * inset,
            escape_xml(&self.config.accent_color),
            2.0 / zoom,
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

/// Render a single element inside its own rotated coordinate frame.
fn write_element(svg: &mut String, element: &CanvasElement, assets: &AssetCache) {
    let [a, b, c, d, e, f] = element_transform(element).coeffs;
    let _ = write!(svg, "<g transform=\"matrix({a} {b} {c} {d} {e} {f})\">");

    let opacity = element.opacity.clamp(0.0, 1.0);
    match &element.kind {
        ElementKind::Text(text) => write_text(svg, text, element.size, opacity),
        ElementKind::Shape(shape) => write_shape(svg, shape, element.size, opacity),
        ElementKind::Image(image) => write_image(svg, image, element.size, opacity, assets),
    }

    svg.push_str("</g>");
    tracing::trace!("Drew {} element {}", element.kind.type_name(), element.id);
}

#[allow(clippy::cast_precision_loss)]
fn write_text(svg: &mut String, text: &TextProps, size: Size, opacity: f32) {
    let (x, anchor) = match text.text_align {
        TextAlign::Left => (0.0, "start"),
        TextAlign::Center => (size.width / 2.0, "middle"),
        TextAlign::Right => (size.width, "end"),
    };
    let weight = serde_plain(text.font_weight);
    let style = serde_plain(text.font_style);
    let family = escape_xml(&text.font_family.replace(['\'', '"'], ""));
    let color = escape_xml(&text.color);

    for (index, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let y = index as f32 * text.line_height();
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" font-family=\"'{family}', sans-serif\" font-size=\"{}\" \
             font-weight=\"{weight}\" font-style=\"{style}\" fill=\"{color}\" fill-opacity=\"{opacity}\" \
             text-anchor=\"{anchor}\" dominant-baseline=\"text-before-edge\" xml:space=\"preserve\">{}</text>",
            text.font_size,
            escape_xml(line),
        );
    }
}

fn write_shape(svg: &mut String, shape: &ShapeProps, size: Size, opacity: f32) {
    let fill = paint_attr(&shape.fill);
    let stroked = shape.stroke_width > 0.0;
    let stroke = if stroked {
        paint_attr(&shape.stroke)
    } else {
        "none".to_string()
    };
    let paint = format!(
        "fill=\"{fill}\" fill-opacity=\"{opacity}\" stroke=\"{stroke}\" stroke-opacity=\"{opacity}\" stroke-width=\"{}\"",
        shape.stroke_width,
    );

    match shape.shape_type {
        ShapeType::Rectangle => {
            // Negative sizes extend left and up from the element position.
            let (x, width) = (size.width.min(0.0), size.width.abs());
            let (y, height) = (size.height.min(0.0), size.height.abs());
            if width > 0.0 && height > 0.0 {
                let _ = write!(
                    svg,
                    "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" {paint}/>",
                );
            } else if stroked && (width > 0.0 || height > 0.0) {
                // A flat box has no fill but its outline still shows as a line.
                let _ = write!(
                    svg,
                    "<path d=\"M{x} {y} H{} V{} H{x} Z\" fill=\"none\" stroke=\"{stroke}\" stroke-opacity=\"{opacity}\" stroke-width=\"{}\"/>",
                    x + width,
                    y + height,
                    shape.stroke_width,
                );
            }
        }
        ShapeType::Circle => {
            let r = size.width.min(size.height) / 2.0;
            let _ = write!(
                svg,
                "<circle cx=\"{}\" cy=\"{}\" r=\"{r}\" {paint}/>",
                size.width / 2.0,
                size.height / 2.0,
            );
        }
        ShapeType::Line => {
            // Stroked regardless of width; a zero width falls back to 1.
            let width = if stroked { shape.stroke_width } else { 1.0 };
            let mid = size.height / 2.0;
            let _ = write!(
                svg,
                "<line x1=\"0\" y1=\"{mid}\" x2=\"{}\" y2=\"{mid}\" stroke=\"{}\" stroke-opacity=\"{opacity}\" stroke-width=\"{width}\"/>",
                size.width,
                paint_attr(&shape.stroke),
            );
        }
    }
}

fn write_image(svg: &mut String, image: &ImageProps, size: Size, opacity: f32, assets: &AssetCache) {
    let Some(asset) = assets.ready(&image.src) else {
        tracing::trace!("Image not ready, skipped this frame");
        return;
    };
    let _ = write!(
        svg,
        "<image width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" opacity=\"{opacity}\" xlink:href=\"{}\"/>",
        size.width,
        size.height,
        escape_xml(&asset.data_uri),
    );
}

fn paint_attr(paint: &Paint) -> String {
    paint.color().map_or_else(|| "none".to_string(), escape_xml)
}

/// Lowercase wire name of a unit enum.
fn serde_plain<T: serde::Serialize>(value: T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "normal".to_string(),
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::Position;

    fn renderer() -> Renderer {
        Renderer::new(RendererConfig {
            load_system_fonts: false,
            ..Default::default()
        })
    }

    fn rect(id: &str, x: f32, y: f32, w: f32, h: f32, fill: &str) -> CanvasElement {
        let mut element = CanvasElement::shape_at(Position::new(x, y))
            .with_size(Size::new(w, h))
            .with_id(id);
        if let ElementKind::Shape(shape) = &mut element.kind {
            shape.fill = Paint::from(fill);
            shape.stroke_width = 0.0;
        }
        element
    }

    fn rgb(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
        let p = pixmap.pixel(x, y).expect("pixel in bounds");
        (p.red(), p.green(), p.blue())
    }

    const CANVAS: Size = Size::new(200.0, 200.0);

    #[test]
    fn test_svg_structure_and_zoom() {
        let elements = vec![rect("r", 10.0, 10.0, 50.0, 50.0, "#ff0000")];
        let svg = renderer().compose_svg(
            &Frame::new(&elements, Size::new(800.0, 600.0)).with_zoom(2.0),
            &AssetCache::new(),
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"1600\""));
        assert!(svg.contains("viewBox=\"0 0 800 600\""));
        assert!(svg.contains("fill=\"#ff0000\""));
    }

    #[test]
    fn test_rect_fill_pixels() {
        let elements = vec![rect("r", 10.0, 10.0, 50.0, 50.0, "#ff0000")];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");
        assert_eq!(rgb(&pixmap, 30, 30), (255, 0, 0));
        assert_eq!(rgb(&pixmap, 100, 100), (255, 255, 255));
    }

    #[test]
    fn test_later_elements_draw_on_top() {
        let elements = vec![
            rect("bottom", 0.0, 0.0, 100.0, 100.0, "#ff0000"),
            rect("top", 50.0, 50.0, 100.0, 100.0, "#0000ff"),
        ];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");
        assert_eq!(rgb(&pixmap, 75, 75), (0, 0, 255));
        assert_eq!(rgb(&pixmap, 25, 25), (255, 0, 0));
    }

    #[test]
    fn test_negative_rect_extends_up_and_left() {
        let elements = vec![rect("r", 100.0, 50.0, -50.0, 40.0, "#ff0000")];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");
        assert_eq!(rgb(&pixmap, 75, 70), (255, 0, 0));
        assert_eq!(rgb(&pixmap, 110, 70), (255, 255, 255));
    }

    #[test]
    fn test_flat_rect_strokes_as_line() {
        let flat = CanvasElement::shape_at(Position::new(50.0, 100.0))
            .with_size(Size::new(100.0, 0.0))
            .with_id("flat");
        let empty = CanvasElement::shape_at(Position::new(20.0, 20.0))
            .with_size(Size::new(0.0, 0.0))
            .with_id("empty");
        let elements = vec![flat, empty];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");
        assert_eq!(rgb(&pixmap, 70, 100), (0x1e, 0x40, 0xaf));
        assert_eq!(rgb(&pixmap, 70, 110), (255, 255, 255));
        assert_eq!(rgb(&pixmap, 20, 20), (255, 255, 255));
    }

    #[test]
    fn test_circle_centered_in_box() {
        let mut filled = rect("c", 0.0, 0.0, 100.0, 40.0, "#ff0000");
        let mut ring = rect("o", 0.0, 100.0, 100.0, 40.0, "transparent");
        for (element, stroke_width) in [(&mut filled, 0.0), (&mut ring, 2.0)] {
            if let ElementKind::Shape(shape) = &mut element.kind {
                shape.shape_type = ShapeType::Circle;
                shape.stroke = Paint::from("#000000");
                shape.stroke_width = stroke_width;
            }
        }
        let elements = vec![filled, ring];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");

        // Radius is min(w, h) / 2 = 20 around (50, 20).
        assert_eq!(rgb(&pixmap, 50, 20), (255, 0, 0));
        assert_eq!(rgb(&pixmap, 5, 20), (255, 255, 255));
        assert_eq!(rgb(&pixmap, 25, 20), (255, 255, 255));

        // Transparent fill leaves the interior untouched.
        assert_eq!(rgb(&pixmap, 50, 120), (255, 255, 255));
        let (r, _, _) = rgb(&pixmap, 50, 100);
        assert!(r < 64, "outline drawn at the top of the ring, got {r}");
    }

    #[test]
    fn test_rotation_about_center() {
        let mut element = rect("r", 50.0, 75.0, 100.0, 50.0, "#ff0000");
        element.rotation = 90.0;
        let elements = vec![element];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");
        // Rotated box spans x 75..125, y 50..150.
        assert_eq!(rgb(&pixmap, 100, 55), (255, 0, 0));
        assert_eq!(rgb(&pixmap, 60, 100), (255, 255, 255));
    }

    #[test]
    fn test_opacity_blends_with_background() {
        let mut element = rect("r", 0.0, 0.0, 100.0, 100.0, "#ff0000");
        element.opacity = 0.5;
        let elements = vec![element];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");
        let (r, g, b) = rgb(&pixmap, 50, 50);
        assert_eq!(r, 255);
        assert!((126..=129).contains(&g), "g = {g}");
        assert_eq!(g, b);
    }

    #[test]
    fn test_transparent_fill_draws_nothing() {
        let elements = vec![rect("r", 0.0, 0.0, 100.0, 100.0, "transparent")];
        let pixmap = renderer()
            .render(&Frame::new(&elements, CANVAS), &AssetCache::new())
            .expect("render");
        assert_eq!(rgb(&pixmap, 50, 50), (255, 255, 255));
    }

    #[test]
    fn test_selection_outline_is_drawn_outside_box() {
        let elements = vec![rect("r", 100.0, 100.0, 50.0, 50.0, "transparent")];
        let id = ElementId::from("r");
        let r = renderer();
        let assets = AssetCache::new();

        let plain = r.render(&Frame::new(&elements, CANVAS), &assets).expect("render");
        let selected = r
            .render(&Frame::new(&elements, CANVAS).with_selection(Some(&id)), &assets)
            .expect("render");

        assert_eq!(rgb(&plain, 100, 98), (255, 255, 255));
        let (red, _, blue) = rgb(&selected, 100, 98);
        assert!(blue > 200 && red < 120, "outline pixel = {:?}", rgb(&selected, 100, 98));
        assert_eq!(r.frame_count(), 2);
    }

    #[test]
    fn test_selection_outline_scales_with_zoom() {
        let elements = vec![rect("r", 100.0, 100.0, 50.0, 50.0, "transparent")];
        let id = ElementId::from("r");
        let svg = renderer().compose_svg(
            &Frame::new(&elements, CANVAS)
                .with_selection(Some(&id))
                .with_zoom(2.0),
            &AssetCache::new(),
        );
        assert!(svg.contains("x=\"99\""));
        assert!(svg.contains("stroke-width=\"1\""));
        assert!(svg.contains("stroke-dasharray=\"2.5 2.5\""));
    }

    #[test]
    fn test_text_layout_attributes() {
        let mut element = CanvasElement::text_at(Position::new(0.0, 0.0));
        if let ElementKind::Text(text) = &mut element.kind {
            text.content = "one\ntwo & <three>".to_string();
            text.text_align = TextAlign::Center;
            text.font_weight = canvas_core::FontWeight::Bold;
        }
        let elements = vec![element];
        let svg = renderer().compose_svg(&Frame::new(&elements, CANVAS), &AssetCache::new());

        assert!(svg.contains("x=\"100\" y=\"0\""));
        assert_eq!(svg.matches("<text ").count(), 2);
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("font-weight=\"bold\""));
        assert!(svg.contains("two &amp; &lt;three&gt;"));
    }

    #[test]
    fn test_line_with_zero_stroke_width_still_drawn() {
        let mut element = CanvasElement::shape_at(Position::new(0.0, 0.0))
            .with_size(Size::new(100.0, 20.0));
        if let ElementKind::Shape(shape) = &mut element.kind {
            shape.shape_type = ShapeType::Line;
            shape.stroke_width = 0.0;
        }
        let elements = vec![element];
        let svg = renderer().compose_svg(&Frame::new(&elements, CANVAS), &AssetCache::new());
        assert!(svg.contains("<line x1=\"0\" y1=\"10\" x2=\"100\" y2=\"10\""));
        assert!(svg.contains("stroke-width=\"1\""));
    }

    #[test]
    fn test_pending_image_is_skipped() {
        let elements = vec![CanvasElement::image_at(Position::new(0.0, 0.0), "data:image/png;base64,", "x")];
        let svg = renderer().compose_svg(&Frame::new(&elements, CANVAS), &AssetCache::new());
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_invalid_zoom_rejected() {
        let elements = Vec::new();
        assert!(renderer()
            .render(&Frame::new(&elements, CANVAS).with_zoom(0.0), &AssetCache::new())
            .is_err());
    }
}
