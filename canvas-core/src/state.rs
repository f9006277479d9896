//! Editor state: the scene, the view and the gesture controller for one
//! editing session.
//!
//! The pointer state machine, the properties surface and the layers surface
//! all mutate the scene through the methods here, so there is a single
//! mutation path.

use crate::element::{CanvasElement, ElementId};
use crate::error::CanvasResult;
use crate::event::{InputEvent, PointerEvent, PointerPhase};
use crate::geometry::Position;
use crate::interaction::{Action, Interaction, InteractionState, Tool};
use crate::layer::LayerDirection;
use crate::props::{ElementPatch, PropertyEdit};
use crate::scene::{LayerEntry, Scene};
use crate::viewport::Viewport;

/// The complete editor state.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    scene: Scene,
    viewport: Viewport,
    interaction: Interaction,
}

impl EditorState {
    /// Create an empty editor with the default 800×600 canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an editor around an existing scene.
    #[must_use]
    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            ..Self::default()
        }
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Replace the scene wholesale, ending any gesture.
    pub fn replace_scene(&mut self, scene: Scene) {
        self.interaction.cancel();
        self.scene = scene;
    }

    /// The viewport.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable access to the viewport (zoom controls).
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// The active tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.interaction.tool()
    }

    /// Switch tools.
    pub fn set_tool(&mut self, tool: Tool) {
        self.interaction.set_tool(tool);
    }

    /// The gesture in progress.
    #[must_use]
    pub fn interaction_state(&self) -> &InteractionState {
        self.interaction.state()
    }

    /// The selected element ID.
    #[must_use]
    pub fn selection(&self) -> Option<&ElementId> {
        self.scene.selection()
    }

    /// Process an input event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event would create an element that cannot be
    /// added to the scene.
    pub fn process_event(&mut self, event: &InputEvent) -> CanvasResult<Vec<Action>> {
        match event {
            InputEvent::Pointer(pointer) => self.pointer(pointer),
            InputEvent::Resize { width, height } => {
                self.viewport.fit_container(*width, *height);
                tracing::debug!(
                    "Canvas resized to {}x{}",
                    self.viewport.canvas_size.width,
                    self.viewport.canvas_size.height
                );
                Ok(Vec::new())
            }
        }
    }

    /// Process a pointer event.
    ///
    /// # Errors
    ///
    /// See [`EditorState::process_event`].
    pub fn pointer(&mut self, event: &PointerEvent) -> CanvasResult<Vec<Action>> {
        match event.phase {
            PointerPhase::Down => {
                self.interaction
                    .pointer_down(&mut self.scene, &self.viewport, event)
            }
            PointerPhase::Move => Ok(self
                .interaction
                .pointer_move(&mut self.scene, &mut self.viewport, event)),
            PointerPhase::Up => {
                self.interaction.pointer_up();
                Ok(Vec::new())
            }
            PointerPhase::Cancel => {
                self.interaction.cancel();
                Ok(Vec::new())
            }
            PointerPhase::Click => Ok(self.interaction.click(&self.viewport, event)),
        }
    }

    /// Finish the image tool flow: place an image at `position` and select it.
    ///
    /// # Errors
    ///
    /// Returns an error if the element cannot be added.
    pub fn complete_image(
        &mut self,
        position: Position,
        src: impl Into<String>,
        alt: impl Into<String>,
    ) -> CanvasResult<ElementId> {
        let id = self
            .scene
            .add_element(CanvasElement::image_at(position, src, alt))?;
        self.scene.select(&id)?;
        Ok(id)
    }

    /// Apply a partial update. Unknown IDs are a no-op returning `false`.
    pub fn update(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        self.scene.update(id, patch)
    }

    /// Apply raw property-panel input to one field.
    ///
    /// Returns `false` when nothing changed (unknown ID or unparseable number).
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields or invalid enumerated values.
    pub fn edit_property(&mut self, id: &ElementId, field: &str, raw: &str) -> CanvasResult<bool> {
        let patch = PropertyEdit::parse(field, raw)?;
        if patch.is_empty() {
            return Ok(false);
        }
        Ok(self.scene.update(id, &patch))
    }

    /// Delete an element. Unknown IDs are a no-op returning `None`.
    pub fn delete(&mut self, id: &ElementId) -> Option<CanvasElement> {
        let removed = self.scene.remove_element(id);
        if removed.is_some() {
            tracing::debug!("Deleted element {id}");
        }
        removed
    }

    /// Change an element's stacking order. Returns `true` if it changed.
    pub fn reorder(&mut self, id: &ElementId, direction: LayerDirection) -> bool {
        self.scene.reorder(id, direction)
    }

    /// Select an element from the layers surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn select(&mut self, id: &ElementId) -> CanvasResult<()> {
        self.scene.select(id)
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.scene.clear_selection();
    }

    /// Layer list rows, top-most first.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerEntry> {
        self.scene.layers()
    }
}
