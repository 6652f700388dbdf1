//! Accounts repository trait.

use async_trait::async_trait;

use crate::{AccountId, AccountsError, ProviderType};

/// Persistence of the provider identity → account mapping.
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    /// Looks up the account linked to `(provider_type, external_id)`.
    ///
    /// # Errors
    ///
    /// * [`AccountsError::NotFound`] - no link exists
    /// * [`AccountsError::Integrity`] - the stored link is inconsistent
    /// * other variants - persistence failures
    async fn resolve_id_by_provider(
        &self,
        provider_type: ProviderType,
        external_id: &str,
    ) -> Result<AccountId, AccountsError>;

    /// Creates a new account linked to `(provider_type, external_id)`.
    ///
    /// # Errors
    ///
    /// * [`AccountsError::AlreadyExists`] - the identity (or, pathologically,
    ///   the generated account id) already exists; nothing was written
    /// * other variants - persistence failures
    async fn create(
        &self,
        provider_type: ProviderType,
        external_id: &str,
    ) -> Result<AccountId, AccountsError>;
}
