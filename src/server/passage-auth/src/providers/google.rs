//! Google provider: server auth code exchange plus id token verification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{optional_field, required_field};
use crate::oauth::{exchange_authorization_code, ClientCredentials};
use crate::{
    AuthData, AuthError, AuthProvider, AuthResult, IdTokenVerifier, KeyLease, ProviderType,
    PublicKeyCache, VerificationFailure,
};

/// Auth data field carrying the server auth code.
const CODE_FIELD: &str = "token";
/// Optional auth data field carrying the expected nonce.
const NONCE_FIELD: &str = "nonce";

/// Default token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Default signing keys endpoint (JWKS).
pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
/// Default expected issuer.
pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";

/// Google OAuth client configuration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Token endpoint.
    pub token_url: String,
    /// Signing keys endpoint.
    pub certs_url: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// Lifetime of fetched keys.
    pub key_lease: KeyLease,
}

impl GoogleConfig {
    /// Creates a configuration with Google's public endpoints.
    ///
    /// The expected audience defaults to the client id.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let client_id = client_id.into();
        Self {
            audience: client_id.clone(),
            client_id,
            client_secret: client_secret.into(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            certs_url: GOOGLE_CERTS_URL.to_string(),
            issuer: GOOGLE_ISSUER.to_string(),
            key_lease: KeyLease::FromHeaders {
                fallback: Duration::from_secs(3600),
            },
        }
    }

    /// Checks that every setting is present.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (name, value) in [
            ("google client id", &self.client_id),
            ("google client secret", &self.client_secret),
            ("google token url", &self.token_url),
            ("google certs url", &self.certs_url),
            ("google issuer", &self.issuer),
            ("google audience", &self.audience),
        ] {
            if value.is_empty() {
                return Err(AuthError::Configuration(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

/// Authenticates Google users from a server auth code.
#[derive(Debug)]
pub struct GoogleProvider {
    config: GoogleConfig,
    client: Client,
    verifier: IdTokenVerifier,
}

impl GoogleProvider {
    /// Creates the provider, validating the configuration.
    pub fn new(config: GoogleConfig, client: Client) -> Result<Self, AuthError> {
        config.validate()?;
        let verifier = IdTokenVerifier::new(
            client.clone(),
            config.certs_url.clone(),
            &config.issuer,
            &config.audience,
            config.key_lease,
        );
        Ok(Self {
            config,
            client,
            verifier,
        })
    }

    /// Replaces the public key cache.
    pub fn with_key_cache(mut self, cache: Arc<PublicKeyCache>) -> Self {
        self.verifier = self.verifier.with_cache(cache);
        self
    }

    /// The public key cache used for id token verification.
    pub fn key_cache(&self) -> &Arc<PublicKeyCache> {
        self.verifier.cache()
    }
}

#[async_trait]
impl AuthProvider for GoogleProvider {
    async fn authenticate(&self, data: &AuthData) -> Result<AuthResult, AuthError> {
        let code = required_field(data, CODE_FIELD)?;
        let nonce = optional_field(data, NONCE_FIELD);

        let id_token = exchange_authorization_code(
            &self.client,
            &self.config.token_url,
            ClientCredentials {
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
            },
            code,
        )
        .await?;

        let claims = self.verifier.verify(&id_token).await?;

        if let Some(expected) = nonce {
            if claims.nonce.as_deref() != Some(expected) {
                return Err(VerificationFailure::Nonce.into());
            }
        }

        debug!(sub = %claims.sub, "Google identity verified");
        Ok(AuthResult::new(claims.sub))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Google
    }
}
