//! Redb-backed blob store.
//!
//! Uses [redb](https://github.com/cberner/redb), a pure Rust embedded
//! B-tree database, as a single `blobs` table mapping string keys to
//! byte values. All operations are ACID-compliant.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use super::{StorageBackend, StorageError};

const BLOBS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("blobs");

/// Key-value store backed by a single redb file.
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Opens or creates the database file and the blobs table.
    ///
    /// The table is created eagerly so read transactions never have to
    /// handle a missing table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref())
            .map_err(|e| StorageError::DatabaseError(format!("Failed to open database: {}", e)))?;

        let write_txn = db.begin_write().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;
        write_txn.open_table(BLOBS_TABLE).map_err(|e| {
            StorageError::DatabaseError(format!("Failed to create blobs table: {}", e))
        })?;
        write_txn.commit().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to commit table creation: {}", e))
        })?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait::async_trait(?Send)]
impl StorageBackend for RedbStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;
        {
            let mut table = write_txn.open_table(BLOBS_TABLE).map_err(|e| {
                StorageError::DatabaseError(format!("Failed to open blobs table: {}", e))
            })?;
            table
                .insert(key, data)
                .map_err(|e| StorageError::DatabaseError(format!("Failed to insert blob: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::DatabaseError(format!("Failed to commit blob: {}", e)))?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;
        let table = read_txn.open_table(BLOBS_TABLE).map_err(|e| {
            StorageError::DatabaseError(format!("Failed to open blobs table: {}", e))
        })?;
        match table.get(key) {
            Ok(Some(guard)) => Ok(guard.value().to_vec()),
            Ok(None) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::DatabaseError(format!(
                "Failed to read blob: {}",
                e
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;
        let table = read_txn.open_table(BLOBS_TABLE).map_err(|e| {
            StorageError::DatabaseError(format!("Failed to open blobs table: {}", e))
        })?;
        match table.get(key) {
            Ok(entry) => Ok(entry.is_some()),
            Err(e) => Err(StorageError::DatabaseError(format!(
                "Failed to read blob: {}",
                e
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;
        {
            let mut table = write_txn.open_table(BLOBS_TABLE).map_err(|e| {
                StorageError::DatabaseError(format!("Failed to open blobs table: {}", e))
            })?;
            // Remove returns Ok(None) if the key didn't exist, which is fine
            table
                .remove(key)
                .map_err(|e| StorageError::DatabaseError(format!("Failed to delete blob: {}", e)))?;
        }
        write_txn.commit().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to commit blob deletion: {}", e))
        })?;
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;
        let table = read_txn.open_table(BLOBS_TABLE).map_err(|e| {
            StorageError::DatabaseError(format!("Failed to open blobs table: {}", e))
        })?;

        let mut keys = Vec::new();
        let iter = table
            .iter()
            .map_err(|e| StorageError::DatabaseError(format!("Failed to iterate blobs: {}", e)))?;
        for result in iter {
            let (key, _) = result.map_err(|e| {
                StorageError::DatabaseError(format!("Failed to read blob entry: {}", e))
            })?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;
        write_txn.delete_table(BLOBS_TABLE).map_err(|e| {
            StorageError::DatabaseError(format!("Failed to delete blobs table: {}", e))
        })?;
        write_txn.open_table(BLOBS_TABLE).map_err(|e| {
            StorageError::DatabaseError(format!("Failed to recreate blobs table: {}", e))
        })?;
        write_txn
            .commit()
            .map_err(|e| StorageError::DatabaseError(format!("Failed to commit clear: {}", e)))?;
        Ok(())
    }
}
