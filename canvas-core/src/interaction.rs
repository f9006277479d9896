//! Tools and the pointer gesture state machine.
//!
//! A gesture runs from pointer-down to pointer-up. While one is active the
//! [`InteractionState`] carries its anchor and target; every other piece of
//! session state (scene, selection, viewport) is passed in by the caller.
//! Pointer-up and cancel return to [`InteractionState::Idle`] from any state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, ElementId};
use crate::error::{CanvasError, CanvasResult};
use crate::event::PointerEvent;
use crate::geometry::{self, Position, Size};
use crate::scene::Scene;
use crate::viewport::Viewport;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Select and drag existing elements (default).
    #[default]
    Select,
    /// Place a new text element.
    Text,
    /// Drag out a new rectangle.
    Shape,
    /// Place an image chosen from a file picker.
    Image,
    /// Pan the view.
    Pan,
}

impl FromStr for Tool {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(Self::Select),
            "text" => Ok(Self::Text),
            "shape" => Ok(Self::Shape),
            "image" => Ok(Self::Image),
            "pan" => Ok(Self::Pan),
            other => Err(CanvasError::InvalidOperation(format!("unknown tool '{other}'"))),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "select",
            Self::Text => "text",
            Self::Shape => "shape",
            Self::Image => "image",
            Self::Pan => "pan",
        })
    }
}

/// The gesture currently in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the view.
    Panning {
        /// Client-space pointer minus the pan offset at pointer-down.
        anchor: Position,
    },
    /// Moving an existing element.
    DraggingElement {
        /// Element being moved.
        id: ElementId,
        /// Canvas-space pointer minus the element's position at pointer-down.
        anchor: Position,
    },
    /// Sizing a freshly created shape.
    CreatingShape {
        /// Element being sized.
        id: ElementId,
        /// Canvas-space corner where the drag started.
        anchor: Position,
    },
}

/// Effects of an input event, reported back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    /// A new element was appended to the scene.
    ElementCreated {
        /// The new element.
        id: ElementId,
    },
    /// An element was dragged to a new position.
    ElementMoved {
        /// Moved element.
        id: ElementId,
        /// New top-left corner.
        position: Position,
    },
    /// An in-progress shape was resized.
    ElementResized {
        /// Resized element.
        id: ElementId,
        /// New top-left corner.
        position: Position,
        /// New size.
        size: Size,
    },
    /// The selection changed.
    SelectionChanged {
        /// New selection.
        selection: Option<ElementId>,
    },
    /// The view was panned.
    PanChanged {
        /// New pan offset in screen pixels.
        offset: Position,
    },
    /// The host should open a file picker and report back with
    /// [`crate::EditorState::complete_image`].
    FilePickerRequested {
        /// Canvas-space position of the click.
        position: Position,
    },
}

impl Action {
    /// Whether the scene must be re-rendered after this action.
    ///
    /// Panning is a display-time transform and never needs a redraw.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Self::PanChanged { .. } | Self::FilePickerRequested { .. })
    }
}

/// The interaction controller: the active tool plus the gesture state.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    tool: Tool,
    state: InteractionState,
}

impl Interaction {
    /// A controller with the select tool and no gesture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. A gesture in progress continues until pointer-up.
    pub fn set_tool(&mut self, tool: Tool) {
        tracing::debug!("Tool changed: {} -> {tool}", self.tool);
        self.tool = tool;
    }

    /// The gesture in progress.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Whether no gesture is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Handle pointer-down. Only starts a gesture from idle.
    ///
    /// # Errors
    ///
    /// Returns an error if a created element cannot be added to the scene.
    pub fn pointer_down(
        &mut self,
        scene: &mut Scene,
        viewport: &Viewport,
        event: &PointerEvent,
    ) -> CanvasResult<Vec<Action>> {
        if !self.is_idle() {
            tracing::debug!("Pointer down ignored, gesture already active: {:?}", self.state);
            return Ok(Vec::new());
        }
        let point = geometry::to_canvas_position(event.client, event.rect, viewport.zoom);

        match self.tool {
            Tool::Pan => {
                self.state = InteractionState::Panning {
                    anchor: event.client.minus(viewport.pan_offset),
                };
                Ok(Vec::new())
            }
            Tool::Select => {
                let hit = scene
                    .element_at(point)
                    .map(|element| (element.id.clone(), element.position));
                match hit {
                    Some((id, position)) => {
                        scene.select(&id)?;
                        self.state = InteractionState::DraggingElement {
                            id: id.clone(),
                            anchor: point.minus(position),
                        };
                        Ok(vec![Action::SelectionChanged {
                            selection: Some(id),
                        }])
                    }
                    None => {
                        scene.clear_selection();
                        Ok(vec![Action::SelectionChanged { selection: None }])
                    }
                }
            }
            Tool::Text => {
                let id = scene.add_element(CanvasElement::text_at(point))?;
                scene.select(&id)?;
                Ok(created(id))
            }
            Tool::Shape => {
                let id = scene.add_element(CanvasElement::shape_at(point))?;
                scene.select(&id)?;
                self.state = InteractionState::CreatingShape {
                    id: id.clone(),
                    anchor: point,
                };
                Ok(created(id))
            }
            Tool::Image => Ok(Vec::new()),
        }
    }

    /// Handle pointer-move for the active gesture. No-op while idle.
    pub fn pointer_move(
        &mut self,
        scene: &mut Scene,
        viewport: &mut Viewport,
        event: &PointerEvent,
    ) -> Vec<Action> {
        let point = geometry::to_canvas_position(event.client, event.rect, viewport.zoom);

        match &self.state {
            InteractionState::Idle => Vec::new(),
            InteractionState::Panning { anchor } => {
                viewport.pan_offset = event.client.minus(*anchor);
                vec![Action::PanChanged {
                    offset: viewport.pan_offset,
                }]
            }
            InteractionState::DraggingElement { id, anchor } => {
                let position = geometry::clamp_to_canvas(point.minus(*anchor), viewport.canvas_size);
                let Some(element) = scene.get_element_mut(id) else {
                    return Vec::new();
                };
                element.position = position;
                vec![Action::ElementMoved {
                    id: id.clone(),
                    position,
                }]
            }
            InteractionState::CreatingShape { id, anchor } => {
                let position = anchor.min(point);
                let size = Size::spanning(*anchor, point);
                let Some(element) = scene.get_element_mut(id) else {
                    return Vec::new();
                };
                element.position = position;
                element.size = size;
                vec![Action::ElementResized {
                    id: id.clone(),
                    position,
                    size,
                }]
            }
        }
    }

    /// Handle pointer-up: end any gesture.
    pub fn pointer_up(&mut self) {
        self.reset();
    }

    /// Handle a platform cancel: end any gesture.
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Handle a completed click. Only the image tool reacts.
    #[must_use]
    pub fn click(&self, viewport: &Viewport, event: &PointerEvent) -> Vec<Action> {
        if self.tool != Tool::Image {
            return Vec::new();
        }
        let position = geometry::to_canvas_position(event.client, event.rect, viewport.zoom);
        vec![Action::FilePickerRequested { position }]
    }

    fn reset(&mut self) {
        if !self.is_idle() {
            tracing::debug!("Gesture ended: {:?}", self.state);
        }
        self.state = InteractionState::Idle;
    }
}

fn created(id: ElementId) -> Vec<Action> {
    vec![
        Action::ElementCreated { id: id.clone() },
        Action::SelectionChanged {
            selection: Some(id),
        },
    ]
}
