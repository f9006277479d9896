//! WebAssembly bindings for canvas-core.
//!
//! This module provides JavaScript-callable functions when compiled to WASM.
//! Results that carry structure (actions, layers, scene) cross the boundary as
//! JSON strings.

use wasm_bindgen::prelude::*;

use crate::{
    ClientRect, EditorState, ElementId, LayerDirection, PickedFile, PointerEvent, PointerPhase,
    Position, Scene, Tool,
};

/// Initialize the canvas WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
}

/// Editor instance for WASM.
#[wasm_bindgen]
pub struct WasmEditor {
    state: EditorState,
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(to_js_error)
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create a new editor instance.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: EditorState::new(),
        }
    }

    /// Switch tools by name (`select`, `text`, `shape`, `image`, `pan`).
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown tool names.
    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        self.state.set_tool(tool.parse::<Tool>().map_err(to_js_error)?);
        Ok(())
    }

    /// Current tool name.
    #[wasm_bindgen(js_name = getTool)]
    #[must_use]
    pub fn get_tool(&self) -> String {
        self.state.tool().to_string()
    }

    /// Pointer pressed. Returns the resulting actions as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if the event cannot be applied.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32, left: f32, top: f32) -> Result<String, JsValue> {
        self.pointer(PointerPhase::Down, x, y, left, top)
    }

    /// Pointer moved. Returns the resulting actions as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if the actions cannot be serialized.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32, left: f32, top: f32) -> Result<String, JsValue> {
        self.pointer(PointerPhase::Move, x, y, left, top)
    }

    /// Pointer released.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        let _ = self.state.pointer(&PointerEvent::at(PointerPhase::Up, 0.0, 0.0));
    }

    /// Gesture aborted by the platform.
    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self) {
        let _ = self
            .state
            .pointer(&PointerEvent::at(PointerPhase::Cancel, 0.0, 0.0));
    }

    /// Completed click. Returns the resulting actions as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if the actions cannot be serialized.
    #[wasm_bindgen(js_name = click)]
    pub fn click(&mut self, x: f32, y: f32, left: f32, top: f32) -> Result<String, JsValue> {
        self.pointer(PointerPhase::Click, x, y, left, top)
    }

    /// Place the image the user picked. Returns the new element ID.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file is not an image.
    #[wasm_bindgen(js_name = completeImage)]
    pub fn complete_image(
        &mut self,
        x: f32,
        y: f32,
        bytes: Vec<u8>,
        filename: String,
        content_type: String,
    ) -> Result<String, JsValue> {
        let (src, alt) = PickedFile::new(bytes, filename, content_type)
            .into_image_source()
            .map_err(to_js_error)?;
        let id = self
            .state
            .complete_image(Position::new(x, y), src, alt)
            .map_err(to_js_error)?;
        Ok(id.to_string())
    }

    /// Apply raw property-panel input. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown fields or invalid values.
    #[wasm_bindgen(js_name = editProperty)]
    pub fn edit_property(&mut self, id: &str, field: &str, raw: &str) -> Result<bool, JsValue> {
        self.state
            .edit_property(&ElementId::from(id), field, raw)
            .map_err(to_js_error)
    }

    /// Delete an element. Returns whether it existed.
    #[wasm_bindgen(js_name = deleteElement)]
    pub fn delete_element(&mut self, id: &str) -> bool {
        self.state.delete(&ElementId::from(id)).is_some()
    }

    /// Reorder an element (`up`, `down`, `front`, `back`).
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown directions.
    #[wasm_bindgen(js_name = reorder)]
    pub fn reorder(&mut self, id: &str, direction: &str) -> Result<bool, JsValue> {
        let direction = direction.parse::<LayerDirection>().map_err(to_js_error)?;
        Ok(self.state.reorder(&ElementId::from(id), direction))
    }

    /// Select an element by ID, or clear the selection with an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error string if the element is not found.
    #[wasm_bindgen(js_name = select)]
    pub fn select(&mut self, id: &str) -> Result<(), JsValue> {
        if id.is_empty() {
            self.state.clear_selection();
            return Ok(());
        }
        self.state.select(&ElementId::from(id)).map_err(to_js_error)
    }

    /// Selected element ID, if any.
    #[wasm_bindgen(js_name = getSelection)]
    #[must_use]
    pub fn get_selection(&self) -> Option<String> {
        self.state.selection().map(ToString::to_string)
    }

    /// Zoom in one step. Returns the new zoom percentage.
    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> i32 {
        self.state.viewport_mut().zoom_in();
        self.state.viewport().zoom_percent()
    }

    /// Zoom out one step. Returns the new zoom percentage.
    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> i32 {
        self.state.viewport_mut().zoom_out();
        self.state.viewport().zoom_percent()
    }

    /// Reset zoom to 100%.
    #[wasm_bindgen(js_name = resetZoom)]
    pub fn reset_zoom(&mut self) {
        self.state.viewport_mut().reset_zoom();
    }

    /// Fit the canvas to its container.
    #[wasm_bindgen(js_name = fitContainer)]
    pub fn fit_container(&mut self, width: f32, height: f32) {
        self.state.viewport_mut().fit_container(width, height);
    }

    /// Viewport (canvas size, zoom, pan) as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = getViewportJson)]
    pub fn get_viewport_json(&self) -> Result<String, JsValue> {
        to_json(self.state.viewport())
    }

    /// Layer list (top-most first) as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = getLayersJson)]
    pub fn get_layers_json(&self) -> Result<String, JsValue> {
        to_json(&self.state.layers())
    }

    /// Get the current scene as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = getSceneJson)]
    pub fn get_scene_json(&self) -> Result<String, JsValue> {
        self.state.scene().to_json().map_err(to_js_error)
    }

    /// Replace the scene from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails or IDs collide.
    #[wasm_bindgen(js_name = loadSceneJson)]
    pub fn load_scene_json(&mut self, json: &str) -> Result<(), JsValue> {
        let scene = Scene::from_json(json).map_err(to_js_error)?;
        self.state.replace_scene(scene);
        Ok(())
    }
}

impl WasmEditor {
    fn pointer(
        &mut self,
        phase: PointerPhase,
        client_x: f32,
        client_y: f32,
        rect_left: f32,
        rect_top: f32,
    ) -> Result<String, JsValue> {
        let event = PointerEvent::new(
            phase,
            Position::new(client_x, client_y),
            ClientRect::new(rect_left, rect_top),
        );
        let actions = self.state.pointer(&event).map_err(to_js_error)?;
        to_json(&actions)
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasm_editor_new_creates_default_instance() {
        let editor = WasmEditor::new();
        assert_eq!(editor.get_tool(), "select");
        assert!(editor.get_selection().is_none());
    }

    #[test]
    fn shape_gesture_through_bindings() {
        let mut editor = WasmEditor::default();
        assert!(editor.set_tool("shape").is_ok());
        assert!(editor.pointer_down(50.0, 50.0, 0.0, 0.0).is_ok());
        assert!(editor.pointer_move(20.0, 80.0, 0.0, 0.0).is_ok());
        editor.pointer_up();

        let scene = Scene::from_json(&editor.get_scene_json().unwrap_or_default())
            .expect("scene json");
        assert_eq!(scene.elements()[0].position, Position::new(20.0, 50.0));
        assert!(editor.get_selection().is_some());
    }

    #[test]
    fn zoom_controls_report_percent() {
        let mut editor = WasmEditor::new();
        assert_eq!(editor.zoom_in(), 120);
        editor.reset_zoom();
        assert_eq!(editor.zoom_out(), 83);
    }

    #[test]
    fn scene_json_roundtrip() {
        let mut editor = WasmEditor::new();
        assert!(editor.set_tool("text").is_ok());
        assert!(editor.pointer_down(10.0, 10.0, 0.0, 0.0).is_ok());
        let json = editor.get_scene_json().unwrap_or_default();

        let mut other = WasmEditor::new();
        assert!(other.load_scene_json(&json).is_ok());
        assert_eq!(other.get_scene_json().unwrap_or_default(), json);
    }
}
