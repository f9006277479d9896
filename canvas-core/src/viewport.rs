//! Canvas size, zoom and pan: the view onto the scene.

use serde::{Deserialize, Serialize};

use crate::geometry::{Position, Size};

/// Smallest canvas the editor will lay out.
pub const MIN_CANVAS_SIZE: Size = Size::new(800.0, 600.0);
/// Padding subtracted from the container on each axis when fitting.
pub const CONTAINER_PADDING: f32 = 40.0;
/// Multiplicative zoom step.
pub const ZOOM_STEP: f32 = 1.2;
/// Largest zoom factor.
pub const MAX_ZOOM: f32 = 5.0;
/// Smallest zoom factor.
pub const MIN_ZOOM: f32 = 0.1;

/// The editing viewport.
///
/// `pan_offset` is a display-time translation in screen pixels. It never
/// enters canvas-space conversion or rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Logical canvas dimensions.
    pub canvas_size: Size,
    /// Zoom factor applied to the drawing surface.
    pub zoom: f32,
    /// Screen-space translation of the surface.
    pub pan_offset: Position,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            canvas_size: MIN_CANVAS_SIZE,
            zoom: 1.0,
            pan_offset: Position::default(),
        }
    }
}

impl Viewport {
    /// Create a viewport with the default canvas size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the zoom in, capped at [`MAX_ZOOM`].
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    /// Step the zoom out, floored at [`MIN_ZOOM`].
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Back to 100%.
    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    /// Zoom rounded to a whole percentage, for display.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn zoom_percent(&self) -> i32 {
        (self.zoom * 100.0).round() as i32
    }

    /// Resize the canvas to fill a container, never below [`MIN_CANVAS_SIZE`].
    pub fn fit_container(&mut self, width: f32, height: f32) {
        self.canvas_size = Size::new(
            MIN_CANVAS_SIZE.width.max(width - CONTAINER_PADDING),
            MIN_CANVAS_SIZE.height.max(height - CONTAINER_PADDING),
        );
    }

    /// Size of the zoomed drawing surface in screen pixels.
    #[must_use]
    pub fn surface_size(&self) -> Size {
        Size::new(
            self.canvas_size.width * self.zoom,
            self.canvas_size.height * self.zoom,
        )
    }
}
