//! Provider type → provider dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::{AuthError, AuthProvider, ProviderType};

/// Registered identity providers, keyed by type.
///
/// Registration normally happens at startup, but the map is guarded so
/// providers can be swapped while requests are in flight.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<ProviderType, Arc<dyn AuthProvider>>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the provider registered for `provider_type`.
    pub fn get(&self, provider_type: ProviderType) -> Result<Arc<dyn AuthProvider>, AuthError> {
        self.providers
            .read()
            .get(&provider_type)
            .cloned()
            .ok_or(AuthError::ProviderNotFound(provider_type))
    }

    /// Registers `provider` for `provider_type`, replacing any previous one.
    pub fn add(&self, provider_type: ProviderType, provider: Arc<dyn AuthProvider>) {
        let replaced = self
            .providers
            .write()
            .insert(provider_type, provider)
            .is_some();
        info!(provider = %provider_type, replaced, "Identity provider registered");
    }

    /// Removes the registration for `provider_type`, returning it if present.
    pub fn remove(&self, provider_type: ProviderType) -> Option<Arc<dyn AuthProvider>> {
        self.providers.write().remove(&provider_type)
    }

    /// Registered provider types, in declaration order.
    pub fn registered(&self) -> Vec<ProviderType> {
        let providers = self.providers.read();
        ProviderType::ALL
            .iter()
            .copied()
            .filter(|t| providers.contains_key(t))
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("registered", &self.registered())
            .finish()
    }
}
