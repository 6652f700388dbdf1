//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entry not found.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// A conditional write in a batch found its precondition violated.
    ///
    /// The whole batch was rejected; nothing was written.
    #[error("condition failed for write #{index} (key {key})")]
    ConditionFailed {
        /// Position of the failing write within the batch.
        index: usize,
        /// Key of the failing write.
        key: String,
    },

    /// Connection error.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution error.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Invalid input (bad key, bad path, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),
}
