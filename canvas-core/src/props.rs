//! Partial element updates and parsing of raw property-panel input.

use serde::{Deserialize, Serialize};

use crate::element::{
    CanvasElement, ElementKind, FontStyle, FontWeight, Paint, ShapeType, TextAlign,
};
use crate::error::{CanvasError, CanvasResult};

/// A partial update to an element. `None` fields are left untouched.
///
/// Fields that do not apply to the target's variant are ignored, and numeric
/// fields carrying non-finite values are skipped rather than written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)] // Each field mirrors the element property of the same name
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,

    pub content: Option<String>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub text_align: Option<TextAlign>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,

    pub shape_type: Option<ShapeType>,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: Option<f32>,

    pub src: Option<String>,
    pub alt: Option<String>,
}

fn set_finite(slot: &mut f32, value: Option<f32>) {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        *slot = v;
    }
}

fn set<T>(slot: &mut T, value: Option<&T>)
where
    T: Clone,
{
    if let Some(v) = value {
        slot.clone_from(v);
    }
}

impl ElementPatch {
    /// Whether the patch carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this patch to `element`.
    pub fn apply_to(&self, element: &mut CanvasElement) {
        set_finite(&mut element.position.x, self.x);
        set_finite(&mut element.position.y, self.y);
        set_finite(&mut element.size.width, self.width);
        set_finite(&mut element.size.height, self.height);
        set_finite(&mut element.rotation, self.rotation);
        set_finite(&mut element.opacity, self.opacity);
        element.opacity = element.opacity.clamp(0.0, 1.0);

        match &mut element.kind {
            ElementKind::Text(text) => {
                set(&mut text.content, self.content.as_ref());
                set_finite(&mut text.font_size, self.font_size);
                set(&mut text.font_family, self.font_family.as_ref());
                set(&mut text.color, self.color.as_ref());
                set(&mut text.text_align, self.text_align.as_ref());
                set(&mut text.font_weight, self.font_weight.as_ref());
                set(&mut text.font_style, self.font_style.as_ref());
            }
            ElementKind::Shape(shape) => {
                set(&mut shape.shape_type, self.shape_type.as_ref());
                set(&mut shape.fill, self.fill.as_ref());
                set(&mut shape.stroke, self.stroke.as_ref());
                set_finite(&mut shape.stroke_width, self.stroke_width);
                shape.stroke_width = shape.stroke_width.max(0.0);
            }
            ElementKind::Image(image) => {
                set(&mut image.src, self.src.as_ref());
                set(&mut image.alt, self.alt.as_ref());
            }
        }
    }
}

/// Builds [`ElementPatch`]es from raw form input, one field at a time.
pub struct PropertyEdit;

impl PropertyEdit {
    /// Parse `raw` input for the property named `field`.
    ///
    /// Numeric fields that fail to parse produce an empty patch, so a half-typed
    /// value never writes `NaN` into the scene. `opacity` is entered as a
    /// percentage (0..100).
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidProperty`] for unknown fields or invalid
    /// enumerated values.
    pub fn parse(field: &str, raw: &str) -> CanvasResult<ElementPatch> {
        let mut patch = ElementPatch::default();
        match field {
            "x" => patch.x = parse_number(raw),
            "y" => patch.y = parse_number(raw),
            "width" => patch.width = parse_number(raw),
            "height" => patch.height = parse_number(raw),
            "rotation" => patch.rotation = parse_number(raw),
            "opacity" => patch.opacity = parse_number(raw).map(|pct| pct / 100.0),
            "fontSize" => patch.font_size = parse_number(raw),
            "strokeWidth" => patch.stroke_width = parse_number(raw),
            "content" => patch.content = Some(raw.to_string()),
            "fontFamily" => patch.font_family = Some(raw.to_string()),
            "color" => patch.color = Some(raw.to_string()),
            "fill" => patch.fill = Some(Paint::from(raw)),
            "stroke" => patch.stroke = Some(Paint::from(raw)),
            "src" => patch.src = Some(raw.to_string()),
            "alt" => patch.alt = Some(raw.to_string()),
            "textAlign" => patch.text_align = Some(parse_enum(field, raw)?),
            "fontWeight" => patch.font_weight = Some(parse_enum(field, raw)?),
            "fontStyle" => patch.font_style = Some(parse_enum(field, raw)?),
            "shapeType" => patch.shape_type = Some(parse_enum(field, raw)?),
            _ => {
                return Err(CanvasError::InvalidProperty {
                    field: field.to_string(),
                    reason: "unknown property".to_string(),
                })
            }
        }

        if patch.is_empty() {
            tracing::debug!("Ignoring unparseable input for {field}: {raw:?}");
        }
        Ok(patch)
    }
}

fn parse_number(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn parse_enum<T>(field: &str, raw: &str) -> CanvasResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|_| {
        CanvasError::InvalidProperty {
            field: field.to_string(),
            reason: format!("unsupported value '{raw}'"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;

    #[test]
    fn test_unparseable_number_is_noop() {
        let mut element = CanvasElement::text_at(Position::new(10.0, 20.0));
        let before = element.clone();

        let patch = PropertyEdit::parse("x", "12abc").expect("known field");
        assert!(patch.is_empty());
        patch.apply_to(&mut element);
        assert_eq!(element, before);

        let patch = PropertyEdit::parse("width", "NaN").expect("known field");
        assert!(patch.is_empty());
    }

    #[test]
    fn test_numeric_edit_applies() {
        let mut element = CanvasElement::text_at(Position::new(10.0, 20.0));
        PropertyEdit::parse("y", " 42 ").expect("parse").apply_to(&mut element);
        assert_eq!(element.position.y, 42.0);
    }

    #[test]
    fn test_opacity_is_percent_and_clamped() {
        let mut element = CanvasElement::text_at(Position::default());
        PropertyEdit::parse("opacity", "50").expect("parse").apply_to(&mut element);
        assert!((element.opacity - 0.5).abs() < f32::EPSILON);
        PropertyEdit::parse("opacity", "250").expect("parse").apply_to(&mut element);
        assert_eq!(element.opacity, 1.0);
    }

    #[test]
    fn test_fields_for_other_variants_are_ignored() {
        let mut element = CanvasElement::shape_at(Position::default());
        let before = element.clone();
        PropertyEdit::parse("content", "hello").expect("parse").apply_to(&mut element);
        assert_eq!(element, before);
    }

    #[test]
    fn test_stroke_width_never_negative() {
        let mut element = CanvasElement::shape_at(Position::default());
        PropertyEdit::parse("strokeWidth", "-4").expect("parse").apply_to(&mut element);
        let ElementKind::Shape(shape) = &element.kind else {
            panic!("expected shape");
        };
        assert_eq!(shape.stroke_width, 0.0);
    }

    #[test]
    fn test_enum_fields() {
        let mut element = CanvasElement::text_at(Position::default());
        PropertyEdit::parse("textAlign", "center").expect("parse").apply_to(&mut element);
        PropertyEdit::parse("fontWeight", "bold").expect("parse").apply_to(&mut element);
        let ElementKind::Text(text) = &element.kind else {
            panic!("expected text");
        };
        assert_eq!(text.text_align, TextAlign::Center);
        assert_eq!(text.font_weight, FontWeight::Bold);

        assert!(PropertyEdit::parse("textAlign", "justify").is_err());
        assert!(PropertyEdit::parse("zIndex", "3").is_err());
    }

    #[test]
    fn test_fill_transparent() {
        let patch = PropertyEdit::parse("fill", "transparent").expect("parse");
        assert_eq!(patch.fill, Some(Paint::Transparent));
    }

    #[test]
    fn test_patch_ignores_non_finite_values() {
        let mut element = CanvasElement::text_at(Position::new(1.0, 1.0));
        ElementPatch {
            x: Some(f32::NAN),
            rotation: Some(f32::INFINITY),
            ..Default::default()
        }
        .apply_to(&mut element);
        assert_eq!(element.position.x, 1.0);
        assert_eq!(element.rotation, 0.0);
    }
}
