//! Image asset cache keyed by element `src`.
//!
//! Each source moves `Pending -> Ready | Failed` exactly once. Settled
//! entries are never replaced, so a failed image stays failed for the rest
//! of the session and is skipped by every frame.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::image::ImageAsset;

/// Load state of one image source.
#[derive(Debug, Clone)]
pub enum AssetState {
    /// A load is in flight.
    Pending,
    /// Decoded and ready to draw.
    Ready(Arc<ImageAsset>),
    /// Loading or decoding failed.
    Failed(String),
}

impl AssetState {
    /// Whether the state is final.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a ready asset.
    pub hits: u64,
    /// Lookups that found nothing drawable.
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, AssetState>,
    stats: CacheStats,
}

/// Thread-safe cache of image assets.
///
/// Shared between the render path (reads) and loader tasks (writes).
#[derive(Debug, Default)]
pub struct AssetCache {
    inner: RwLock<Inner>,
}

impl AssetCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `src`, if it has ever been requested.
    #[must_use]
    pub fn state(&self, src: &str) -> Option<AssetState> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(src).cloned()
    }

    /// The decoded asset for `src`, if it is ready to draw.
    #[must_use]
    pub fn ready(&self, src: &str) -> Option<Arc<ImageAsset>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let asset = match inner.entries.get(src) {
            Some(AssetState::Ready(asset)) => Some(Arc::clone(asset)),
            _ => None,
        };
        if asset.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        asset
    }

    /// Mark `src` as pending if it has never been requested.
    ///
    /// Returns `true` if the caller now owns the load.
    pub fn begin(&self, src: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.entries.contains_key(src) {
            return false;
        }
        inner.entries.insert(src.to_string(), AssetState::Pending);
        true
    }

    /// Record the outcome of a load. Settled entries are left untouched.
    ///
    /// Returns the state now stored for `src`.
    pub fn complete(&self, src: &str, outcome: Result<ImageAsset, String>) -> AssetState {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = inner
            .entries
            .entry(src.to_string())
            .or_insert(AssetState::Pending);
        if !entry.is_settled() {
            *entry = match outcome {
                Ok(asset) => AssetState::Ready(Arc::new(asset)),
                Err(reason) => AssetState::Failed(reason),
            };
        }
        entry.clone()
    }

    /// Store an already-decoded asset.
    pub fn insert_ready(&self, src: impl Into<String>, asset: ImageAsset) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .entries
            .insert(src.into(), AssetState::Ready(Arc::new(asset)));
    }

    /// Get the current number of tracked sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageFormat;

    fn asset() -> ImageAsset {
        ImageAsset {
            width: 1,
            height: 1,
            format: ImageFormat::Png,
            data_uri: "data:image/png;base64,".to_string(),
        }
    }

    #[test]
    fn test_begin_claims_once() {
        let cache = AssetCache::new();
        assert!(cache.begin("a"));
        assert!(!cache.begin("a"));
        assert!(matches!(cache.state("a"), Some(AssetState::Pending)));
        assert!(cache.ready("a").is_none());
    }

    #[test]
    fn test_complete_settles_once() {
        let cache = AssetCache::new();
        cache.begin("a");
        assert!(matches!(
            cache.complete("a", Err("boom".into())),
            AssetState::Failed(_)
        ));
        // A later success does not resurrect a failed source.
        assert!(matches!(cache.complete("a", Ok(asset())), AssetState::Failed(_)));
        assert!(!cache.begin("a"));
    }

    #[test]
    fn test_ready_counts_hits_and_misses() {
        let cache = AssetCache::new();
        cache.insert_ready("a", asset());

        assert!(cache.ready("a").is_some());
        assert!(cache.ready("b").is_none());
        assert!(cache.ready("a").is_some());

        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
        assert_eq!(cache.len(), 1);
    }
}
