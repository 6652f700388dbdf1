//! In-memory storage backend.
//!
//! Backs development mode and tests. Clones share the same underlying map,
//! so a handle can be given to several components at once.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{StorageBackend, StorageError, WriteBatch, WriteCondition};

/// Thread-safe in-memory key/value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.data.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.data.write().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .data
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn write_batch(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut data = self.data.write();

        // Conditions are checked against the state before any write applies.
        for (index, write) in batch.writes().iter().enumerate() {
            if write.condition == WriteCondition::NotExists && data.contains_key(&write.key) {
                return Err(StorageError::ConditionFailed {
                    index,
                    key: write.key.clone(),
                });
            }
        }

        for write in batch.into_writes() {
            data.insert(write.key, write.value);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let backend = MemoryBackend::new();

        assert!(backend.get("k").await.unwrap().is_none());

        backend.put("k", b"v1").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v1".to_vec()));
        assert!(backend.exists("k").await.unwrap());

        backend.put("k", b"v2").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v2".to_vec()));

        backend.delete("k").await.unwrap();
        assert!(!backend.exists("k").await.unwrap());

        // Deleting again is fine
        backend.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_prefix() {
        let backend = MemoryBackend::new();
        backend.put("identity#guest#a", b"1").await.unwrap();
        backend.put("identity#guest#b", b"2").await.unwrap();
        backend.put("identity#google#c", b"3").await.unwrap();
        backend.put("account#x", b"4").await.unwrap();

        let keys = backend.list("identity#guest#").await.unwrap();
        assert_eq!(keys, vec!["identity#guest#a", "identity#guest#b"]);

        assert_eq!(backend.list("").await.unwrap().len(), 4);
        assert!(backend.list("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_applies_all_writes() {
        let backend = MemoryBackend::new();
        let batch = WriteBatch::new()
            .put_if_absent("a", b"1".to_vec())
            .put_if_absent("b", b"2".to_vec());

        backend.write_batch(batch).await.unwrap();

        assert_eq!(backend.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(backend.get("b").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_batch_condition_failure_writes_nothing() {
        let backend = MemoryBackend::new();
        backend.put("b", b"existing").await.unwrap();

        let batch = WriteBatch::new()
            .put_if_absent("a", b"1".to_vec())
            .put_if_absent("b", b"2".to_vec());

        let result = backend.write_batch(batch).await;
        match result {
            Err(StorageError::ConditionFailed { index, key }) => {
                assert_eq!(index, 1);
                assert_eq!(key, "b");
            },
            other => panic!("expected condition failure, got {other:?}"),
        }

        assert!(backend.get("a").await.unwrap().is_none());
        assert_eq!(backend.get("b").await.unwrap(), Some(b"existing".to_vec()));
    }

    #[tokio::test]
    async fn test_unconditional_batch_write_overwrites() {
        let backend = MemoryBackend::new();
        backend.put("a", b"old").await.unwrap();

        backend
            .write_batch(WriteBatch::new().put("a", b"new".to_vec()))
            .await
            .unwrap();

        assert_eq!(backend.get("a").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conditional_batches_single_winner() {
        let backend = MemoryBackend::new();

        let mut handles = Vec::new();
        for i in 0..16 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                let batch = WriteBatch::new()
                    .put_if_absent("shared", format!("{i}").into_bytes())
                    .put_if_absent(format!("own-{i}"), b"x".to_vec());
                backend.write_batch(batch).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        // The winner wrote exactly two keys; losers wrote none.
        assert_eq!(backend.len(), 2);
    }
}
