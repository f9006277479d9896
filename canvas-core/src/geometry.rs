//! Canvas-space geometry: positions, sizes, pointer conversion and hit-testing.

use serde::{Deserialize, Serialize};

use crate::element::CanvasElement;

/// A point in canvas-local, un-zoomed coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise subtraction.
    #[must_use]
    pub fn minus(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }
}

/// Width and height of an element's bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in canvas units.
    pub width: f32,
    /// Height in canvas units.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size spanning two corners, regardless of their order.
    #[must_use]
    pub fn spanning(a: Position, b: Position) -> Self {
        Self::new((b.x - a.x).abs(), (b.y - a.y).abs())
    }
}

/// The on-screen bounding rectangle of the drawing surface, in client pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRect {
    /// Left edge in client pixels.
    pub left: f32,
    /// Top edge in client pixels.
    pub top: f32,
}

impl ClientRect {
    /// Create a client rect from its top-left corner.
    #[must_use]
    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

/// Convert a pointer's client coordinates to canvas-space.
///
/// Only zoom is compensated here. The pan offset is a display-time
/// translation and is deliberately left out.
#[must_use]
pub fn to_canvas_position(client: Position, rect: ClientRect, zoom: f32) -> Position {
    Position::new((client.x - rect.left) / zoom, (client.y - rect.top) / zoom)
}

/// Whether `point` lies inside the element's un-rotated box (edges inclusive).
#[must_use]
pub fn contains_point(element: &CanvasElement, point: Position) -> bool {
    let p = element.position;
    let s = element.size;
    point.x >= p.x && point.x <= p.x + s.width && point.y >= p.y && point.y <= p.y + s.height
}

/// Find the top-most element whose box contains `point`.
///
/// Scans from the last index (top of the stack) down to index 0. Rotation is
/// ignored: boxes are tested pre-rotation.
#[must_use]
pub fn hit_test(elements: &[CanvasElement], point: Position) -> Option<&CanvasElement> {
    elements
        .iter()
        .rev()
        .find(|element| contains_point(element, point))
}

/// Clamp a dragged element's top-left corner to the canvas.
///
/// Uses a fixed 50-unit margin on the far edges, independent of the element's
/// own size.
#[must_use]
pub fn clamp_to_canvas(position: Position, canvas: Size) -> Position {
    Position::new(
        clamp_axis(position.x, canvas.width - DRAG_MARGIN),
        clamp_axis(position.y, canvas.height - DRAG_MARGIN),
    )
}

/// Margin kept between a dragged element's top-left corner and the far canvas edges.
pub const DRAG_MARGIN: f32 = 50.0;

// max(0, min(v, hi)); a canvas smaller than the margin pins to 0.
fn clamp_axis(value: f32, hi: f32) -> f32 {
    value.min(hi).max(0.0)
}

/// A 2D affine transform `[a b c d e f]`, mapping `(x, y)` to
/// `(a·x + c·y + e, b·x + d·y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Row-major coefficients in SVG `matrix()` order.
    pub coeffs: [f32; 6],
}

impl Affine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        coeffs: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Pure translation.
    #[must_use]
    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            coeffs: [1.0, 0.0, 0.0, 1.0, tx, ty],
        }
    }

    /// Rotation about the origin, clockwise on a y-down surface.
    #[must_use]
    pub fn rotate_degrees(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            coeffs: [cos, sin, -sin, cos, 0.0, 0.0],
        }
    }

    /// Compose so that `other` is applied first, then `self`.
    #[must_use]
    pub fn then_apply(self, other: Self) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.coeffs;
        let [a2, b2, c2, d2, e2, f2] = other.coeffs;
        Self {
            coeffs: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * e2 + c1 * f2 + e1,
                b1 * e2 + d1 * f2 + f1,
            ],
        }
    }

    /// Map a point through this transform.
    #[must_use]
    pub fn apply(&self, point: Position) -> Position {
        let [a, b, c, d, e, f] = self.coeffs;
        Position::new(
            a * point.x + c * point.y + e,
            b * point.x + d * point.y + f,
        )
    }
}

/// The transform from an element's box-local space to canvas space.
///
/// Translate to the box center, rotate, then translate back by half the size,
/// so rotation pivots on the element's own center and local `(0, 0)` is the
/// box's top-left corner when unrotated.
#[must_use]
pub fn element_transform(element: &CanvasElement) -> Affine {
    let half_w = element.size.width / 2.0;
    let half_h = element.size.height / 2.0;
    Affine::translate(element.position.x + half_w, element.position.y + half_h)
        .then_apply(Affine::rotate_degrees(element.rotation))
        .then_apply(Affine::translate(-half_w, -half_h))
}
