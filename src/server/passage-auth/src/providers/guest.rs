//! Guest provider: trusts a client-generated device id.

use async_trait::async_trait;
use tracing::debug;

use super::required_field;
use crate::{AuthData, AuthError, AuthProvider, AuthResult, ProviderType};

/// Auth data field carrying the guest id.
const ID_FIELD: &str = "id";

/// Accepts any non-empty `id` as the subject. Performs no network calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestProvider;

impl GuestProvider {
    /// Creates the guest provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthProvider for GuestProvider {
    async fn authenticate(&self, data: &AuthData) -> Result<AuthResult, AuthError> {
        let id = required_field(data, ID_FIELD)?;
        debug!(id = %id, "Guest identity accepted");
        Ok(AuthResult::new(id))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Guest
    }
}
