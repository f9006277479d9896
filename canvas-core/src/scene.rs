//! The ordered scene of canvas elements and the current selection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, ElementId};
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{self, Position};
use crate::layer::{self, LayerDirection};
use crate::props::ElementPatch;

/// A scene containing all canvas elements.
///
/// The element order is the stacking order: index 0 is drawn first (bottom),
/// the last element is drawn last (top). IDs are unique, and the selection
/// always references an element that is present or is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    /// Elements in stacking order.
    elements: Vec<CanvasElement>,
    /// Currently selected element, if any.
    selection: Option<ElementId>,
}

/// One row of the layer list, top-most first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerEntry {
    /// Element ID.
    pub id: ElementId,
    /// Human-readable label.
    pub name: String,
    /// Wire name of the element variant.
    pub kind: &'static str,
    /// Whether this element is selected.
    pub selected: bool,
    /// Whether `up` would change the order.
    pub can_move_up: bool,
    /// Whether `down` would change the order.
    pub can_move_down: bool,
}

impl Scene {
    /// Create a new empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from an ordered element list.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DuplicateId`] if two elements share an ID.
    pub fn from_elements(elements: Vec<CanvasElement>) -> CanvasResult<Self> {
        let mut seen = HashSet::with_capacity(elements.len());
        for element in &elements {
            if !seen.insert(&element.id) {
                return Err(CanvasError::DuplicateId(element.id.to_string()));
            }
        }
        Ok(Self {
            elements,
            selection: None,
        })
    }

    /// Append an element on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DuplicateId`] if the ID is already present.
    pub fn add_element(&mut self, element: CanvasElement) -> CanvasResult<ElementId> {
        if self.contains(&element.id) {
            return Err(CanvasError::DuplicateId(element.id.to_string()));
        }
        let id = element.id.clone();
        tracing::debug!("Added {} element {id}", element.kind.type_name());
        self.elements.push(element);
        Ok(id)
    }

    /// Remove an element. Unknown IDs are a no-op returning `None`.
    ///
    /// Clears the selection if it referenced the removed element.
    pub fn remove_element(&mut self, id: &ElementId) -> Option<CanvasElement> {
        let index = self.index_of(id)?;
        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        Some(self.elements.remove(index))
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get_element(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_element_mut(&mut self, id: &ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    /// Whether an element with `id` is present.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.index_of(id).is_some()
    }

    /// Stack index of an element.
    #[must_use]
    pub fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    /// All elements, bottom to top.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// Apply a partial update. Returns `false` if the ID is unknown.
    pub fn update(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        match self.get_element_mut(id) {
            Some(element) => {
                patch.apply_to(element);
                true
            }
            None => {
                tracing::debug!("Update ignored, element {id} not in scene");
                false
            }
        }
    }

    /// Change the stacking order of an element.
    ///
    /// Returns `true` only if the order changed.
    pub fn reorder(&mut self, id: &ElementId, direction: LayerDirection) -> bool {
        let changed = layer::reorder(&mut self.elements, id, direction);
        if !changed {
            tracing::debug!("Reorder {direction} of {id} left the stack unchanged");
        }
        changed
    }

    /// Find the top-most element at a canvas-space point.
    #[must_use]
    pub fn element_at(&self, point: Position) -> Option<&CanvasElement> {
        geometry::hit_test(&self.elements, point)
    }

    /// Select an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn select(&mut self, id: &ElementId) -> CanvasResult<()> {
        if self.contains(id) {
            self.selection = Some(id.clone());
            Ok(())
        } else {
            Err(CanvasError::ElementNotFound(id.to_string()))
        }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The selected element ID.
    #[must_use]
    pub fn selection(&self) -> Option<&ElementId> {
        self.selection.as_ref()
    }

    /// The selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&CanvasElement> {
        self.selection.as_ref().and_then(|id| self.get_element(id))
    }

    /// Layer list rows, top-most first.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerEntry> {
        let len = self.elements.len();
        self.elements
            .iter()
            .enumerate()
            .rev()
            .map(|(index, element)| LayerEntry {
                id: element.id.clone(),
                name: element.display_name(),
                kind: element.kind.type_name(),
                selected: self.selection.as_ref() == Some(&element.id),
                can_move_up: layer::can_move(index, len, LayerDirection::Up),
                can_move_down: layer::can_move(index, len, LayerDirection::Down),
            })
            .collect()
    }

    /// Get the number of elements in the scene.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the scene is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialize the scene to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Deserialize a scene from JSON.
    ///
    /// A selection that does not reference a present element is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or IDs are not unique.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        serde_json::from_str(json).map_err(CanvasError::Serialization)
    }

    fn from_wire(wire: SceneWire) -> CanvasResult<Self> {
        let mut scene = Self::from_elements(wire.elements)?;
        if let Some(id) = wire.selection {
            if scene.select(&id).is_err() {
                tracing::debug!("Dropping dangling selection {id}");
            }
        }
        Ok(scene)
    }
}

impl<'de> Deserialize<'de> for Scene {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Self::from_wire(SceneWire::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
struct SceneWire {
    #[serde(default)]
    elements: Vec<CanvasElement>,
    #[serde(default)]
    selection: Option<ElementId>,
}
