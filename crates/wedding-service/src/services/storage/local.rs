//! Local filesystem backend.
//!
//! Objects are written under a root directory and served by the HTTP
//! router below the configured public prefix.

use super::{validate_key, BlobStore};
use crate::errors::WeddingError;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

/// Stores objects as files under `root`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf, public_prefix: String) -> Self {
        Self {
            root,
            public_prefix: format!("/{}", public_prefix.trim_matches('/')),
        }
    }

    /// Create the root directory if needed.
    pub async fn ensure_root(&self) -> Result<(), WeddingError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            WeddingError::Storage(format!(
                "failed to create storage root {}: {e}",
                self.root.display()
            ))
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, WeddingError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_prefix, key)
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, WeddingError> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                WeddingError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        // Write to a sibling temp file and rename, so readers never see a
        // partially written object.
        let tmp_path = path.with_file_name(format!(".{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp_path, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(WeddingError::Storage(format!(
                "failed to write {}: {e}",
                tmp_path.display()
            )));
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(WeddingError::Storage(format!(
                "failed to move object into place at {}: {e}",
                path.display()
            )));
        }

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), WeddingError> {
        let path = self.path_for(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WeddingError::Storage(format!(
                "failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    async fn health_check(&self) -> Result<(), WeddingError> {
        let metadata = tokio::fs::metadata(&self.root).await.map_err(|e| {
            WeddingError::Storage(format!(
                "storage root {} unavailable: {e}",
                self.root.display()
            ))
        })?;

        if !metadata.is_dir() || metadata.permissions().readonly() {
            return Err(WeddingError::Storage(format!(
                "storage root {} is not a writable directory",
                self.root.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> LocalBlobStore {
        LocalBlobStore::new(dir.path().to_path_buf(), "uploads/".to_string())
    }

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let url = store
            .put(
                "gallery/1-abc.png",
                Bytes::from_static(b"\x89PNG"),
                "image/png",
            )
            .await
            .unwrap();

        assert_eq!(url, "/uploads/gallery/1-abc.png");
        let written = std::fs::read(dir.path().join("gallery/1-abc.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .put("photos/2-def.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("photos"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["2-def.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .put("gallery/x.gif", Bytes::from_static(b"GIF89a"), "image/gif")
            .await
            .unwrap();
        store.delete("gallery/x.gif").await.unwrap();
        assert!(!dir.path().join("gallery/x.gif").exists());

        // Second delete of the same key still succeeds
        store.delete("gallery/x.gif").await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let result = store
            .put("../escape.png", Bytes::from_static(b"x"), "image/png")
            .await;
        assert!(matches!(result, Err(WeddingError::Storage(_))));

        let result = store.delete("gallery/../../etc/passwd").await;
        assert!(matches!(result, Err(WeddingError::Storage(_))));
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.health_check().await.is_ok());

        let missing = LocalBlobStore::new(dir.path().join("missing"), "/uploads".to_string());
        assert!(missing.health_check().await.is_err());

        missing.ensure_root().await.unwrap();
        assert!(missing.health_check().await.is_ok());
    }
}
