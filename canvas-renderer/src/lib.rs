//! # Saorsa Canvas Renderer
//!
//! Deterministic rasterizer for the editor scene.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ Frame        │──▶│ SVG compose │──▶│ resvg/tiny-skia  │──▶ Pixmap
//! │ (elements,   │   │ (per element│   │ rasterization    │
//! │  zoom, sel.) │   │  transform) │   └──────────────────┘
//! └──────────────┘   └──────▲──────┘            │
//!                           │                   ▼
//!                    ┌──────┴──────┐     ┌─────────────┐
//!                    │ AssetCache  │◀────│ ImageLoader │ (async, redraw
//!                    └─────────────┘     └─────────────┘  notifications)
//! ```
//!
//! The live view and [`SceneExporter`] share one render path, so an export
//! matches the on-screen pixels at zoom 1.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset_cache;
pub mod error;
pub mod export;
pub mod image;
pub mod loader;
pub mod render;

pub use asset_cache::{AssetCache, AssetState, CacheStats};
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, SceneExporter};
pub use image::{decode_data_uri, decode_image, parse_data_uri, ImageAsset, ImageFormat};
pub use loader::{AssetFetcher, ImageLoader, OfflineFetcher, RedrawRequest};
pub use render::{Frame, Renderer, RendererConfig, SELECTION_ACCENT};

/// Renderer version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
