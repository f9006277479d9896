//! # Canvas Core
//!
//! Core logic for the design editor canvas: the element model, the ordered
//! scene, and the pointer state machine that turns input into element
//! mutations. Compiles to WASM (feature `wasm`) for use in the browser.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 EditorState                 │
//! ├─────────────────────────────────────────────┤
//! │  Scene            │  Interaction            │
//! │  - Elements       │  - Tool                 │
//! │  - Stacking order │  - Gesture state        │
//! │  - Selection      │  - Actions              │
//! ├─────────────────────────────────────────────┤
//! │  Geometry         │  Viewport               │
//! │  - Hit-testing    │  - Zoom                 │
//! │  - Transforms     │  - Pan offset           │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod interaction;
pub mod layer;
pub mod props;
pub mod scene;
pub mod state;
pub mod viewport;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use asset::{data_url, is_image_content_type, PickedFile};
pub use element::{
    CanvasElement, ElementId, ElementKind, FontStyle, FontWeight, ImageProps, Paint, ShapeProps,
    ShapeType, TextAlign, TextProps,
};
pub use error::{CanvasError, CanvasResult};
pub use event::{InputEvent, PointerEvent, PointerPhase};
pub use geometry::{element_transform, hit_test, Affine, ClientRect, Position, Size};
pub use interaction::{Action, Interaction, InteractionState, Tool};
pub use layer::LayerDirection;
pub use props::{ElementPatch, PropertyEdit};
pub use scene::{LayerEntry, Scene};
pub use state::EditorState;
pub use viewport::Viewport;

/// Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
