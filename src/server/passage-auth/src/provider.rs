//! Identity provider trait.

use async_trait::async_trait;

use crate::{AuthData, AuthError, AuthResult, ProviderType};

/// Trait for identity providers.
///
/// Implementations verify the opaque credential map and return the
/// provider's stable subject id on success.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies the credentials and returns the external identity.
    ///
    /// # Arguments
    ///
    /// * `data` - Provider-defined credential fields
    ///
    /// # Returns
    ///
    /// * `Ok(AuthResult)` - If the credentials are valid
    /// * `Err(AuthError)` - Missing field, exchange or verification failure
    async fn authenticate(&self, data: &AuthData) -> Result<AuthResult, AuthError>;

    /// Returns the provider type this implementation serves.
    fn provider_type(&self) -> ProviderType;
}
