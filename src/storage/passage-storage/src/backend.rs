//! Storage backend trait definition.

use async_trait::async_trait;

use crate::batch::WriteBatch;
use crate::error::StorageError;

/// Storage backend trait for implementing different storage engines.
///
/// Point reads are expected to be strongly consistent with [`write_batch`]:
/// once a batch commits, every subsequent `get` on its keys observes it.
///
/// [`write_batch`]: StorageBackend::write_batch
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get a value by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Put a value with a key, overwriting any previous value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete a value by key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List keys with a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Applies every write of the batch atomically.
    ///
    /// Either all writes become visible or none do. If any write's
    /// [`WriteCondition`](crate::WriteCondition) does not hold, the batch is
    /// rejected with [`StorageError::ConditionFailed`] naming the first
    /// failing write.
    async fn write_batch(&self, batch: WriteBatch) -> Result<(), StorageError>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }
}
