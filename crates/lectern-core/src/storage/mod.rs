//! Durable key-value blob storage used by the index cache.
//!
//! The cache manager treats persistence as an opaque collaborator: it
//! saves and loads named blobs and requires nothing beyond round-trip
//! fidelity. [`RedbStorage`] is the on-disk implementation;
//! [`InMemoryStorage`] is a no-op used when persistence is disabled.

mod redb_store;

pub use redb_store::RedbStorage;

use thiserror::Error;

/// Key-value blob storage abstraction.
#[async_trait::async_trait(?Send)]
pub trait StorageBackend {
    /// Save binary data to storage with a key.
    #[must_use = "Storage save failures should be handled"]
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Load binary data from storage by key.
    #[must_use = "Storage load failures should be handled"]
    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check if a key exists in storage.
    #[must_use = "Storage check failures should be handled"]
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete data by key. Deleting a missing key is not an error.
    #[must_use = "Storage delete failures should be handled"]
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List all keys in storage.
    #[must_use = "Storage listing failures should be handled"]
    async fn list_keys(&self) -> Result<Vec<String>, StorageError>;

    /// Clear all stored data.
    #[must_use = "Storage clear failures should be handled"]
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Storage backend that doesn't persist data.
/// Every load misses, so the engine rebuilds from the corpus each run.
#[derive(Default)]
pub struct InMemoryStorage;

impl InMemoryStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait(?Send)]
impl StorageBackend for InMemoryStorage {
    async fn save(&self, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(Vec::new())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
