//! Account repository error types.

use thiserror::Error;

/// Errors that can occur while resolving or creating accounts.
#[derive(Debug, Error)]
pub enum AccountsError {
    /// No account is linked to the provider identity.
    #[error("account not found")]
    NotFound,

    /// The provider identity or the generated account id already exists.
    ///
    /// Returned when a concurrent creation won the race; callers should
    /// resolve again.
    #[error("provider identity or account already exists ({operation})")]
    AlreadyExists {
        /// Which write of the creation transaction was rejected.
        operation: &'static str,
    },

    /// Stored data violates the one-identity-one-account invariant.
    #[error("data integrity violation: {0}")]
    Integrity(String),

    /// Invalid input (empty external id, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown provider type tag.
    #[error("unknown provider type: {0}")]
    UnknownProviderType(String),

    /// Record (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<passage_storage::StorageError> for AccountsError {
    fn from(e: passage_storage::StorageError) -> Self {
        AccountsError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for AccountsError {
    fn from(e: serde_json::Error) -> Self {
        AccountsError::Serialization(e.to_string())
    }
}
