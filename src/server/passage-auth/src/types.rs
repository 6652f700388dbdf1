//! Authentication request and result types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use passage_accounts::{AccountId, ProviderType};

/// Opaque, provider-defined credential fields.
pub type AuthData = HashMap<String, String>;

/// Input of a single authentication call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateInput {
    /// Provider to authenticate against.
    pub provider_type: ProviderType,
    /// Credential fields for that provider.
    #[serde(default)]
    pub auth_data: AuthData,
}

impl AuthenticateInput {
    /// Creates an input from a provider type and field pairs.
    pub fn new<I, K, V>(provider_type: ProviderType, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            provider_type,
            auth_data: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Outcome of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateOutput {
    /// Account linked to the provider identity.
    pub account_id: AccountId,
    /// True if the account was created by this call.
    pub is_new: bool,
}

/// Identity asserted by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    subject: String,
}

impl AuthResult {
    /// Wraps the provider's external subject id.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// The external subject id.
    pub fn id(&self) -> &str {
        &self.subject
    }
}
