//! Canvas elements - the building blocks of scenes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Position, Size};

/// Opaque unique identifier for an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal text anchor inside the element box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchor at x = 0.
    #[default]
    Left,
    /// Anchor at x = width / 2.
    Center,
    /// Anchor at x = width.
    Right,
}

/// Font weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
}

/// Font style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Geometric primitive drawn by a shape element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Axis-aligned rectangle filling the box.
    #[default]
    Rectangle,
    /// Circle of radius `min(width, height) / 2` centered in the box.
    Circle,
    /// Horizontal segment through the vertical midpoint.
    Line,
}

/// A fill or stroke paint: a CSS color string or the `"transparent"` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Paint {
    /// Nothing is painted.
    Transparent,
    /// A CSS color (e.g. `#3b82f6`).
    Color(String),
}

impl Paint {
    /// The sentinel string for [`Paint::Transparent`].
    pub const TRANSPARENT: &'static str = "transparent";

    /// Whether this paint draws nothing.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }

    /// The color string, or `None` when transparent.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        match self {
            Self::Transparent => None,
            Self::Color(c) => Some(c),
        }
    }
}

impl From<String> for Paint {
    fn from(value: String) -> Self {
        if value == Self::TRANSPARENT {
            Self::Transparent
        } else {
            Self::Color(value)
        }
    }
}

impl From<&str> for Paint {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Paint> for String {
    fn from(value: Paint) -> Self {
        match value {
            Paint::Transparent => Paint::TRANSPARENT.to_string(),
            Paint::Color(c) => c,
        }
    }
}

/// Text-specific properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    /// Text content; `\n` separates lines.
    pub content: String,
    /// Font size in canvas units.
    pub font_size: f32,
    /// Font family name.
    pub font_family: String,
    /// Text color.
    pub color: String,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Font style.
    pub font_style: FontStyle,
}

impl TextProps {
    /// Vertical distance between consecutive baselines.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        self.font_size * 1.2
    }

    /// Content split into drawable lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: "New Text".to_string(),
            font_size: 24.0,
            font_family: "Arial".to_string(),
            color: "#000000".to_string(),
            text_align: TextAlign::Left,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
        }
    }
}

/// Shape-specific properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    /// Primitive to draw.
    pub shape_type: ShapeType,
    /// Interior paint.
    pub fill: Paint,
    /// Outline paint.
    pub stroke: Paint,
    /// Outline width; zero disables the rectangle/circle outline.
    pub stroke_width: f32,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Rectangle,
            fill: Paint::Color("#3b82f6".to_string()),
            stroke: Paint::Color("#1e40af".to_string()),
            stroke_width: 2.0,
        }
    }
}

/// Image-specific properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    /// Image data reference: a data URI or a URL.
    pub src: String,
    /// Human-readable label.
    pub alt: String,
}

/// The content an element carries, keyed by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A block of (possibly multi-line) text.
    Text(TextProps),
    /// A rectangle, circle or line.
    Shape(ShapeProps),
    /// A raster image.
    Image(ImageProps),
}

impl ElementKind {
    /// The wire name of this variant.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Shape(_) => "shape",
            Self::Image(_) => "image",
        }
    }
}

/// Default box for new text elements.
pub const DEFAULT_TEXT_SIZE: Size = Size::new(200.0, 40.0);
/// Default box for new image elements.
pub const DEFAULT_IMAGE_SIZE: Size = Size::new(200.0, 150.0);

/// A single editable element on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    /// Unique identifier within the scene.
    pub id: ElementId,
    /// Top-left corner of the un-rotated box.
    pub position: Position,
    /// Box dimensions.
    pub size: Size,
    /// Rotation in degrees about the box center.
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Variant-specific content.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl CanvasElement {
    /// Create an element with a fresh ID and neutral transform.
    #[must_use]
    pub fn new(kind: ElementKind, position: Position, size: Size) -> Self {
        Self {
            id: ElementId::new(),
            position,
            size,
            rotation: 0.0,
            opacity: 1.0,
            kind,
        }
    }

    /// A default "New Text" element at `position`.
    #[must_use]
    pub fn text_at(position: Position) -> Self {
        Self::new(
            ElementKind::Text(TextProps::default()),
            position,
            DEFAULT_TEXT_SIZE,
        )
    }

    /// A zero-sized default rectangle at `position`, ready to be dragged open.
    #[must_use]
    pub fn shape_at(position: Position) -> Self {
        Self::new(
            ElementKind::Shape(ShapeProps::default()),
            position,
            Size::default(),
        )
    }

    /// An image element at `position` with the default box.
    #[must_use]
    pub fn image_at(position: Position, src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(
            ElementKind::Image(ImageProps {
                src: src.into(),
                alt: alt.into(),
            }),
            position,
            DEFAULT_IMAGE_SIZE,
        )
    }

    /// Replace the ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the size.
    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Label shown in the layer list.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.kind {
            ElementKind::Text(text) => {
                let label: String = text.content.chars().take(20).collect();
                if label.is_empty() {
                    "Text".to_string()
                } else {
                    label
                }
            }
            ElementKind::Shape(shape) => match shape.shape_type {
                ShapeType::Rectangle => "Rectangle",
                ShapeType::Circle => "Circle",
                ShapeType::Line => "Line",
            }
            .to_string(),
            ElementKind::Image(image) => {
                if image.alt.is_empty() {
                    "Image".to_string()
                } else {
                    image.alt.clone()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults() {
        let element = CanvasElement::text_at(Position::new(10.0, 10.0));
        assert_eq!(element.size, Size::new(200.0, 40.0));
        assert_eq!(element.opacity, 1.0);
        let ElementKind::Text(text) = &element.kind else {
            panic!("expected text");
        };
        assert_eq!(text.content, "New Text");
        assert_eq!(text.font_size, 24.0);
        assert_eq!(text.font_family, "Arial");
    }

    #[test]
    fn test_shape_defaults_are_zero_sized() {
        let element = CanvasElement::shape_at(Position::new(5.0, 6.0));
        assert_eq!(element.size, Size::default());
        let ElementKind::Shape(shape) = &element.kind else {
            panic!("expected shape");
        };
        assert_eq!(shape.fill, Paint::Color("#3b82f6".into()));
        assert_eq!(shape.stroke, Paint::Color("#1e40af".into()));
        assert_eq!(shape.stroke_width, 2.0);
    }

    #[test]
    fn test_wire_format_is_type_tagged_camel_case() {
        let element = CanvasElement::text_at(Position::new(1.0, 2.0)).with_id("abc");
        let json = serde_json::to_value(&element).expect("serialize");
        assert_eq!(json["type"], "text");
        assert_eq!(json["id"], "abc");
        assert_eq!(json["fontSize"], 24.0);
        assert_eq!(json["textAlign"], "left");
        assert_eq!(json["position"]["x"], 1.0);

        let back: CanvasElement = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, element);
    }

    #[test]
    fn test_transparent_paint_sentinel() {
        let json = r##"{"id":"s1","type":"shape","position":{"x":0,"y":0},"size":{"width":10,"height":10},
            "rotation":0,"opacity":1,"shapeType":"circle","fill":"transparent","stroke":"#000","strokeWidth":1}"##;
        let element: CanvasElement = serde_json::from_str(json).expect("deserialize");
        let ElementKind::Shape(shape) = &element.kind else {
            panic!("expected shape");
        };
        assert!(shape.fill.is_transparent());
        assert_eq!(shape.stroke.color(), Some("#000"));
        assert_eq!(serde_json::to_value(&shape.fill).expect("paint"), "transparent");
    }

    #[test]
    fn test_display_names() {
        let mut text = CanvasElement::text_at(Position::default());
        if let ElementKind::Text(props) = &mut text.kind {
            props.content = "A rather long heading that keeps going".into();
        }
        assert_eq!(text.display_name(), "A rather long headin");

        let shape = CanvasElement::shape_at(Position::default());
        assert_eq!(shape.display_name(), "Rectangle");

        let image = CanvasElement::image_at(Position::default(), "data:,", "");
        assert_eq!(image.display_name(), "Image");
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ElementId::new(), ElementId::new());
    }
}
