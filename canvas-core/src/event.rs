//! Input events for canvas interaction.

use serde::{Deserialize, Serialize};

use crate::geometry::{ClientRect, Position};

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved, with or without a button held.
    Move,
    /// Button released.
    Up,
    /// The platform aborted the gesture (e.g. pointer capture lost).
    Cancel,
    /// A completed click: down and up without leaving the surface.
    Click,
}

/// A single pointer (mouse or primary touch) event on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// Pointer location in client (screen) pixels.
    pub client: Position,
    /// Bounding rectangle of the drawing surface at the time of the event.
    pub rect: ClientRect,
}

impl PointerEvent {
    /// Create a pointer event.
    #[must_use]
    pub fn new(phase: PointerPhase, client: Position, rect: ClientRect) -> Self {
        Self {
            phase,
            client,
            rect,
        }
    }

    /// Pointer event on a surface anchored at the client origin.
    ///
    /// Convenient for hosts that already report surface-relative coordinates.
    #[must_use]
    pub fn at(phase: PointerPhase, x: f32, y: f32) -> Self {
        Self::new(phase, Position::new(x, y), ClientRect::default())
    }
}

/// All input events the editor can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Pointer (mouse) event.
    Pointer(PointerEvent),

    /// The drawing surface's container was resized.
    Resize {
        /// Container width in client pixels.
        width: f32,
        /// Container height in client pixels.
        height: f32,
    },
}

impl From<PointerEvent> for InputEvent {
    fn from(event: PointerEvent) -> Self {
        Self::Pointer(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_event_wire_format() {
        let event = InputEvent::from(PointerEvent::at(PointerPhase::Down, 3.0, 4.0));
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "Pointer");
        assert_eq!(json["data"]["phase"], "down");
        assert_eq!(json["data"]["client"]["x"], 3.0);

        let back: InputEvent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, event);
    }
}
