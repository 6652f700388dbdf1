//! Authentication orchestration.

use std::sync::Arc;

use passage_accounts::{AccountsError, AccountsRepository};
use tracing::{debug, info, instrument, warn};

use crate::{AuthError, AuthenticateInput, AuthenticateOutput, ProviderRegistry};

/// Authenticates against a provider and resolves the linked account.
///
/// Token verification strictly precedes account resolution, which strictly
/// precedes account creation. Nothing is retried here; a creation race is
/// surfaced as [`AuthError::AccountAlreadyExists`] for the caller to retry.
#[derive(Clone)]
pub struct AuthService {
    registry: Arc<ProviderRegistry>,
    accounts: Arc<dyn AccountsRepository>,
}

impl AuthService {
    /// Creates a new authentication service.
    pub fn new(registry: Arc<ProviderRegistry>, accounts: Arc<dyn AccountsRepository>) -> Self {
        Self { registry, accounts }
    }

    /// The provider registry used for dispatch.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Authenticates `input` and returns the linked account, creating it on
    /// first sight.
    #[instrument(skip_all, fields(provider = %input.provider_type))]
    pub async fn authenticate(
        &self,
        input: &AuthenticateInput,
    ) -> Result<AuthenticateOutput, AuthError> {
        let provider = self.registry.get(input.provider_type)?;
        let identity = provider.authenticate(&input.auth_data).await?;

        match self
            .accounts
            .resolve_id_by_provider(input.provider_type, identity.id())
            .await
        {
            Ok(account_id) => {
                debug!(account_id = %account_id, "Existing account resolved");
                return Ok(AuthenticateOutput {
                    account_id,
                    is_new: false,
                });
            },
            Err(AccountsError::NotFound) => {},
            Err(source) => {
                warn!(error = %source, "Account resolution failed");
                return Err(AuthError::Account {
                    phase: "resolve",
                    source,
                });
            },
        }

        match self.accounts.create(input.provider_type, identity.id()).await {
            Ok(account_id) => {
                info!(account_id = %account_id, "Account created");
                Ok(AuthenticateOutput {
                    account_id,
                    is_new: true,
                })
            },
            Err(e @ AccountsError::AlreadyExists { .. }) => {
                warn!(error = %e, "Concurrent account creation detected");
                Err(AuthError::AccountAlreadyExists(e))
            },
            Err(source) => Err(AuthError::Account {
                phase: "create",
                source,
            }),
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
