//! Object storage for uploaded images.
//!
//! Binaries live in a [`BlobStore`]; PostgreSQL only keeps the key and the
//! public URL. Backends:
//!
//! - `local` - files under a directory, served back by this service
//! - `s3` - S3-compatible bucket behind a public URL
//! - `mock` - in-memory store for tests

pub mod local;
pub mod mock;
pub mod s3;

use crate::config::StorageConfig;
use crate::errors::WeddingError;
use crate::observability::metrics;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

pub use local::LocalBlobStore;
pub use mock::MockBlobStore;
pub use s3::S3BlobStore;

/// Maximum storage key length.
pub const MAX_KEY_LENGTH: usize = 512;

/// Trait for blob storage backends (enables mocking).
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Backend name used in logs, metrics and readiness output.
    fn backend(&self) -> &'static str;

    /// Public URL for a stored key.
    fn public_url(&self, key: &str) -> String;

    /// Store `bytes` under `key`, returning the public URL.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str)
        -> Result<String, WeddingError>;

    /// Remove the object stored under `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), WeddingError>;

    /// Check that the backend is reachable and writable.
    async fn health_check(&self) -> Result<(), WeddingError>;
}

/// Build the configured backend.
pub async fn build_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, WeddingError> {
    match config {
        StorageConfig::Local {
            root,
            public_prefix,
        } => {
            let store = LocalBlobStore::new(root.clone(), public_prefix.clone());
            store.ensure_root().await?;
            Ok(Arc::new(store))
        }
        StorageConfig::S3 {
            bucket,
            public_url,
            endpoint_url,
        } => {
            let store =
                S3BlobStore::connect(bucket.clone(), public_url.clone(), endpoint_url.as_deref())
                    .await;
            Ok(Arc::new(store))
        }
    }
}

/// Reject keys that could escape the storage root or break URLs.
///
/// Keys are relative, `/`-separated, and made of ASCII letters, digits,
/// `.`, `_` and `-`. Empty segments and `.`/`..` segments are rejected.
pub fn validate_key(key: &str) -> Result<(), WeddingError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(WeddingError::Storage(format!(
            "invalid storage key length: {}",
            key.len()
        )));
    }

    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'));
    let valid_segments = key
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if !valid_chars || !valid_segments {
        return Err(WeddingError::Storage(format!(
            "invalid storage key: {key}"
        )));
    }

    Ok(())
}

/// Store an object, recording storage metrics.
#[instrument(skip_all, name = "wedding.storage.put", fields(backend = store.backend(), key = %key))]
pub async fn put_object(
    store: &dyn BlobStore,
    key: &str,
    bytes: Bytes,
    content_type: &str,
) -> Result<String, WeddingError> {
    let start = Instant::now();
    let size = bytes.len();

    let result = store.put(key, bytes, content_type).await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_storage_operation(store.backend(), "put", status, start.elapsed());

    if result.is_ok() {
        tracing::debug!(target: "wedding.storage", size, "Object stored");
    }
    result
}

/// Remove an object, recording storage metrics.
#[instrument(skip_all, name = "wedding.storage.delete", fields(backend = store.backend(), key = %key))]
pub async fn delete_object(store: &dyn BlobStore, key: &str) -> Result<(), WeddingError> {
    let start = Instant::now();

    let result = store.delete(key).await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_storage_operation(store.backend(), "delete", status, start.elapsed());

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_generated_keys() {
        assert!(validate_key("gallery/1735689600000-0b4a9c1e2f3d4a5b8c7d6e5f4a3b2c1d.jpg").is_ok());
        assert!(validate_key("photos/table-12/1735689600000-abc.webp").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        for key in [
            "",
            "../etc/passwd",
            "gallery/../../secret",
            "/absolute/path.jpg",
            "gallery//double.jpg",
            "gallery/./x.jpg",
            "gallery/trailing/",
            "gallery/space name.jpg",
            "gallery\\windows.jpg",
        ] {
            assert!(validate_key(key).is_err(), "{key:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_key_rejects_overlong_keys() {
        let key = format!("gallery/{}", "a".repeat(MAX_KEY_LENGTH));
        assert!(validate_key(&key).is_err());
    }

    #[tokio::test]
    async fn test_put_and_delete_object_helpers() {
        let store = MockBlobStore::new();

        let url = put_object(&store, "gallery/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap_or_default();
        assert_eq!(url, store.public_url("gallery/a.png"));
        assert!(store.contains("gallery/a.png"));

        assert!(delete_object(&store, "gallery/a.png").await.is_ok());
        assert!(!store.contains("gallery/a.png"));
    }
}
