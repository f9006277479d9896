//! Asynchronous image loading.
//!
//! [`ImageLoader::request`] is fire-and-forget: it spawns one task per new
//! source, and each task that finishes successfully sends its own
//! [`RedrawRequest`]. Loads complete in any order. There is no cancellation;
//! an abandoned load still runs to completion and fills the cache.

use std::sync::Arc;

use async_trait::async_trait;
use canvas_core::{CanvasElement, ElementKind};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::asset_cache::{AssetCache, AssetState};
use crate::error::{RenderError, RenderResult};
use crate::image::{self, ImageAsset};

/// Resolves non-`data:` image sources to bytes.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the raw bytes behind `src`.
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>>;
}

/// A fetcher for hosts without network access: every non-`data:` source fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl AssetFetcher for OfflineFetcher {
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>> {
        Err(RenderError::Resource(format!("No fetcher for {src}")))
    }
}

/// Sent when an image becomes drawable and the scene should be re-rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedrawRequest {
    /// The source that finished loading.
    pub src: String,
}

/// Loads image assets into an [`AssetCache`].
#[derive(Clone)]
pub struct ImageLoader {
    cache: Arc<AssetCache>,
    fetcher: Arc<dyn AssetFetcher>,
    redraw: mpsc::UnboundedSender<RedrawRequest>,
    runtime: Handle,
}

impl ImageLoader {
    /// Create a loader and the receiver for its redraw notifications.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a Tokio runtime.
    pub fn new(
        cache: Arc<AssetCache>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> RenderResult<(Self, mpsc::UnboundedReceiver<RedrawRequest>)> {
        let runtime = Handle::try_current()
            .map_err(|e| RenderError::Resource(format!("Image loader needs a runtime: {e}")))?;
        let (redraw, rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                cache,
                fetcher,
                redraw,
                runtime,
            },
            rx,
        ))
    }

    /// The cache this loader fills.
    #[must_use]
    pub fn cache(&self) -> &Arc<AssetCache> {
        &self.cache
    }

    /// Start loading `src` in the background.
    ///
    /// Returns `false` without spawning if `src` is already pending or settled.
    pub fn request(&self, src: &str) -> bool {
        if !self.cache.begin(src) {
            return false;
        }
        let loader = self.clone();
        let src = src.to_string();
        self.runtime.spawn(async move {
            let state = loader.settle(&src).await;
            if matches!(state, AssetState::Ready(_))
                && loader.redraw.send(RedrawRequest { src }).is_err()
            {
                tracing::debug!("Redraw receiver dropped");
            }
        });
        true
    }

    /// Request every image referenced by `elements`. Returns how many loads
    /// were started.
    pub fn request_scene(&self, elements: &[CanvasElement]) -> usize {
        elements
            .iter()
            .filter_map(|element| match &element.kind {
                ElementKind::Image(image) => Some(image.src.as_str()),
                _ => None,
            })
            .filter(|src| self.request(src))
            .count()
    }

    /// Load `src` to completion.
    ///
    /// Settled sources return immediately. A source that is still pending is
    /// resolved here as well; whichever load finishes first settles it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the source failed to load, now or
    /// earlier.
    pub async fn load(&self, src: &str) -> RenderResult<Arc<ImageAsset>> {
        let state = match self.cache.state(src) {
            Some(state) if state.is_settled() => state,
            _ => self.settle(src).await,
        };
        match state {
            AssetState::Ready(asset) => Ok(asset),
            AssetState::Failed(reason) => Err(RenderError::Resource(reason)),
            AssetState::Pending => Err(RenderError::Resource(format!("{src} is still loading"))),
        }
    }

    async fn settle(&self, src: &str) -> AssetState {
        let outcome = self.resolve(src).await.map_err(|e| {
            tracing::warn!("Image {} failed to load: {e}", abbreviate(src));
            e.to_string()
        });
        self.cache.complete(src, outcome)
    }

    async fn resolve(&self, src: &str) -> RenderResult<ImageAsset> {
        let bytes = if src.starts_with("data:") {
            image::parse_data_uri(src)?.1
        } else {
            self.fetcher.fetch(src).await?
        };
        image::decode_image(&bytes)
    }
}

/// Data URIs can be megabytes long; keep log lines readable.
fn abbreviate(src: &str) -> &str {
    match src.char_indices().nth(64) {
        Some((end, _)) => &src[..end],
        None => src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[tokio::test]
    async fn test_request_sends_redraw_when_ready() {
        let cache = Arc::new(AssetCache::new());
        let (loader, mut rx) = ImageLoader::new(cache.clone(), Arc::new(OfflineFetcher))
            .expect("inside runtime");

        assert!(loader.request(PNG_URI));
        assert!(!loader.request(PNG_URI));

        let redraw = rx.recv().await.expect("redraw");
        assert_eq!(redraw.src, PNG_URI);
        assert!(cache.ready(PNG_URI).is_some());
    }

    #[tokio::test]
    async fn test_failed_source_is_not_retried() {
        let cache = Arc::new(AssetCache::new());
        let (loader, _rx) = ImageLoader::new(cache.clone(), Arc::new(OfflineFetcher))
            .expect("inside runtime");

        assert!(loader.load("https://example.invalid/cat.png").await.is_err());
        assert!(matches!(
            cache.state("https://example.invalid/cat.png"),
            Some(AssetState::Failed(_))
        ));
        assert!(!loader.request("https://example.invalid/cat.png"));
    }

    #[tokio::test]
    async fn test_load_decodes_data_uri() {
        let (loader, _rx) = ImageLoader::new(Arc::new(AssetCache::new()), Arc::new(OfflineFetcher))
            .expect("inside runtime");
        let asset = loader.load(PNG_URI).await.expect("load");
        assert_eq!((asset.width, asset.height), (1, 1));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        assert!(ImageLoader::new(Arc::new(AssetCache::new()), Arc::new(OfflineFetcher)).is_err());
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("short"), "short");
        assert_eq!(abbreviate(PNG_URI).len(), 64);
    }
}
