//! Account and provider identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AccountsError;

/// Opaque internal account identifier.
///
/// Generated once at account creation and never changed. The empty value is
/// the "no account" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The "no account" sentinel.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns true for the sentinel value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identity provider kinds.
///
/// Adding a provider means adding a variant here, a provider implementation,
/// and a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Anonymous, device-bound play.
    Guest,
    /// Google sign-in.
    Google,
    /// Sign in with Apple.
    Apple,
}

impl ProviderType {
    /// Every known provider type.
    pub const ALL: [ProviderType; 3] = [ProviderType::Guest, ProviderType::Google, ProviderType::Apple];

    /// Stable lowercase tag, used in storage keys and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Guest => "guest",
            ProviderType::Google => "google",
            ProviderType::Apple => "apple",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = AccountsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(ProviderType::Guest),
            "google" => Ok(ProviderType::Google),
            "apple" => Ok(ProviderType::Apple),
            other => Err(AccountsError::UnknownProviderType(other.to_string())),
        }
    }
}
