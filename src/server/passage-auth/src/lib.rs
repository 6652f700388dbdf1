//! # Passage Auth
//!
//! Authenticates players against third-party identity providers and maps the
//! resulting identity to an internal account.
//!
//! ## Supported Providers
//!
//! - Guest (device-bound, no external call)
//! - Google (OAuth code exchange + id token verification)
//! - Apple (OAuth code exchange + id token verification)
//!
//! ## Flow
//!
//! [`AuthService::authenticate`] picks the provider from the
//! [`ProviderRegistry`], lets it verify the credentials, then resolves the
//! account for the returned subject id, creating it on first sight.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod certs;
pub mod error;
pub mod keys;
pub mod oauth;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod service;
pub mod types;
pub mod verify;

#[cfg(test)]
mod testutil;

pub use certs::PublicKeyCache;
pub use error::{AuthError, VerificationFailure};
pub use keys::KeyLease;
pub use provider::AuthProvider;
pub use providers::{AppleConfig, AppleProvider, GoogleConfig, GoogleProvider, GuestProvider};
pub use registry::ProviderRegistry;
pub use service::AuthService;
pub use types::{AuthData, AuthResult, AuthenticateInput, AuthenticateOutput};
pub use verify::{IdTokenClaims, IdTokenVerifier};

pub use passage_accounts::{AccountId, ProviderType};
