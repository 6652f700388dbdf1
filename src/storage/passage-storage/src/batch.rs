//! Conditional multi-key write batches.

/// Precondition attached to a single write in a [`WriteBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition {
    /// Write unconditionally, overwriting any existing value.
    Always,
    /// Write only if the key does not exist yet.
    NotExists,
}

/// A single put within a [`WriteBatch`].
#[derive(Debug, Clone)]
pub struct BatchWrite {
    /// Target key.
    pub key: String,
    /// Value to store.
    pub value: Vec<u8>,
    /// Condition checked at commit time.
    pub condition: WriteCondition,
}

/// An ordered set of puts committed atomically by
/// [`StorageBackend::write_batch`](crate::StorageBackend::write_batch).
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unconditional put.
    pub fn put(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.writes.push(BatchWrite {
            key: key.into(),
            value: value.into(),
            condition: WriteCondition::Always,
        });
        self
    }

    /// Adds a put that only succeeds if `key` is absent.
    pub fn put_if_absent(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.writes.push(BatchWrite {
            key: key.into(),
            value: value.into(),
            condition: WriteCondition::NotExists,
        });
        self
    }

    /// Returns the writes in insertion order.
    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    /// Number of writes in the batch.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if the batch holds no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consumes the batch, returning its writes.
    pub fn into_writes(self) -> Vec<BatchWrite> {
        self.writes
    }
}
