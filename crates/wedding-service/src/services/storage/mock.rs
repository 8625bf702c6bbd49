//! In-memory blob store for tests.

use super::{validate_key, BlobStore};
use crate::errors::WeddingError;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Base of the URLs handed out by the mock.
pub const MOCK_PUBLIC_BASE: &str = "https://storage.mock.test";

/// A stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Mock blob store keeping objects in a map.
#[derive(Debug, Default)]
pub struct MockBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    put_count: AtomicUsize,
    delete_count: AtomicUsize,
}

impl MockBlobStore {
    /// Create an empty store that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `put` calls fail.
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `delete` calls fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether an object exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.objects().contains_key(key)
    }

    /// Stored object under `key`.
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects().get(key).cloned()
    }

    /// Sorted keys of all stored objects.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    /// Number of `put` calls, failed ones included.
    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls, failed ones included.
    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, StoredObject>> {
        // A panicking test thread must not hide the objects from the others
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl BlobStore for MockBlobStore {
    fn backend(&self) -> &'static str {
        "mock"
    }

    fn public_url(&self, key: &str) -> String {
        format!("{MOCK_PUBLIC_BASE}/{key}")
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, WeddingError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        validate_key(key)?;

        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(WeddingError::Storage("mock put failure".to_string()));
        }

        self.objects().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), WeddingError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        validate_key(key)?;

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(WeddingError::Storage("mock delete failure".to_string()));
        }

        self.objects().remove(key);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), WeddingError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(WeddingError::Storage("mock store unavailable".to_string()));
        }
        Ok(())
    }
}
