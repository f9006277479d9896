//! Uploaded image storage.
//!
//! Images are stored under object keys of the form
//! `<timestamp>-<name>.<subtype>`. Two backends are provided: an in-memory
//! map for tests and ephemeral servers, and a directory on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::validation::{validate_object_key, ValidationError};

/// Errors from the asset store.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No object is stored under the key.
    #[error("image not found: {0}")]
    NotFound(String),

    /// The key is malformed.
    #[error(transparent)]
    InvalidKey(#[from] ValidationError),

    /// Filesystem access failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored image and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type supplied at upload.
    pub content_type: String,
}

/// Object storage for uploaded images.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `asset` under `key`, replacing any previous object.
    async fn put(&self, key: &str, asset: StoredAsset) -> Result<(), AssetError>;

    /// Fetch the object stored under `key`.
    async fn get(&self, key: &str) -> Result<StoredAsset, AssetError>;

    /// Whether the store can currently serve requests.
    async fn is_ready(&self) -> bool {
        true
    }
}

/// Milliseconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Build the object key for an upload.
///
/// Characters outside `[A-Za-z0-9_-]` in `name` and `subtype` become `_`,
/// so keys are safe as both file names and URL path segments.
#[must_use]
pub fn object_key(timestamp: u64, name: &str, subtype: &str) -> String {
    format!("{timestamp}-{}.{}", sanitize(name), sanitize(subtype))
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// In-memory asset store.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    objects: RwLock<HashMap<String, StoredAsset>>,
}

impl MemoryAssetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn put(&self, key: &str, asset: StoredAsset) -> Result<(), AssetError> {
        validate_object_key(key)?;
        self.objects.write().await.insert(key.to_string(), asset);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredAsset, AssetError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(key.to_string()))
    }
}

/// Asset store backed by a directory.
///
/// Each object is written as `<key>` with its content type alongside in
/// `<key>.type`.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!("Storing images in {}", root.display());
        Ok(Self { root })
    }

    /// Store directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paths(&self, key: &str) -> Result<(PathBuf, PathBuf), AssetError> {
        validate_object_key(key)?;
        // Sidecars are not objects.
        if key.ends_with(".type") {
            return Err(AssetError::NotFound(key.to_string()));
        }
        Ok((
            self.root.join(key),
            self.root.join(format!("{key}.type")),
        ))
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn put(&self, key: &str, asset: StoredAsset) -> Result<(), AssetError> {
        let (data_path, type_path) = self.paths(key)?;
        tokio::fs::write(&data_path, &asset.bytes).await?;
        tokio::fs::write(&type_path, asset.content_type.as_bytes()).await?;
        tracing::debug!("Wrote {} bytes to {}", asset.bytes.len(), data_path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredAsset, AssetError> {
        let (data_path, type_path) = self.paths(key)?;
        let bytes = match tokio::fs::read(&data_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let content_type = match tokio::fs::read_to_string(&type_path).await {
            Ok(content_type) => content_type.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "application/octet-stream".to_string()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(StoredAsset {
            bytes,
            content_type,
        })
    }

    async fn is_ready(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
