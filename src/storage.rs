// ABOUTME: Object storage seam for uploaded recipe images
// ABOUTME: Put/get by key with a local filesystem implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Blob storage for uploaded images.
//!
//! The store is an external collaborator: the core only needs put/get by key.
//! Keys are generated server-side so client-supplied names never reach the
//! filesystem.

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use uuid::Uuid;

/// A stored blob with its content type
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Raw object bytes
    pub bytes: Bytes,
    /// MIME content type
    pub content_type: String,
}

/// Blob storage seam: put/get by key
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob, returning the generated key
    async fn put(&self, bytes: Bytes, content_type: &str) -> AppResult<String>;

    /// Fetch a blob by key; `None` if the key does not exist
    async fn get(&self, key: &str) -> AppResult<Option<StoredObject>>;
}

/// Filesystem-backed object store
///
/// Stores each object as `<uuid>.<ext>` under a configured directory, with
/// the extension derived from the content type on write and mapped back on
/// read.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at the given directory, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be created.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::storage(format!("Failed to create image dir: {e}")))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, bytes: Bytes, content_type: &str) -> AppResult<String> {
        let ext = extension_for(content_type)
            .ok_or_else(|| AppError::invalid_input(format!("Unsupported type {content_type}")))?;
        let key = format!("{}.{ext}", Uuid::new_v4());
        let path = self.root.join(&key);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write {key}: {e}")))?;
        tracing::debug!(key = %key, size = bytes.len(), "stored image");
        Ok(key)
    }

    async fn get(&self, key: &str) -> AppResult<Option<StoredObject>> {
        // Keys are flat uuid.ext names; anything else never left this server
        if !is_valid_key(key) {
            return Ok(None);
        }
        let path = self.root.join(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let content_type = key
                    .rsplit_once('.')
                    .and_then(|(_, ext)| content_type_for(ext))
                    .unwrap_or("application/octet-stream");
                Ok(Some(StoredObject {
                    bytes: Bytes::from(bytes),
                    content_type: content_type.to_owned(),
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(format!("Failed to read {key}: {e}"))),
        }
    }
}

/// Map a content type to a stored file extension
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

/// Map a stored extension back to its content type
fn content_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Keys are `<hex-uuid>.<ext>`; reject separators and dotfiles outright
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).await.unwrap();

        let key = store
            .put(Bytes::from_static(b"pngbytes"), "image/png")
            .await
            .unwrap();
        assert!(key.ends_with(".png"));

        let object = store.get(&key).await.unwrap().unwrap();
        assert_eq!(object.bytes.as_ref(), b"pngbytes");
        assert_eq!(object.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).await.unwrap();
        assert!(store.get("nope.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).await.unwrap();
        assert!(store.get("../etc/passwd").await.unwrap().is_none());
        assert!(store.get(".hidden").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_content_type_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).await.unwrap();
        let err = store
            .put(Bytes::from_static(b"zip"), "application/zip")
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }
}
