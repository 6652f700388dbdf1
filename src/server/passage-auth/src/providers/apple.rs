//! Sign in with Apple.
//!
//! The client forwards the authorization code, the user id and the nonce it
//! received on device. The code is exchanged for a fresh id token, which is
//! verified against Apple's JWKS and cross-checked with the device values.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::required_field;
use crate::oauth::{exchange_authorization_code, ClientCredentials};
use crate::{
    AuthData, AuthError, AuthProvider, AuthResult, IdTokenVerifier, KeyLease, ProviderType,
    PublicKeyCache, VerificationFailure,
};

const IDENTITY_TOKEN_FIELD: &str = "identityToken";
const AUTHORIZATION_CODE_FIELD: &str = "authorizationCode";
const USER_ID_FIELD: &str = "userID";
const NONCE_FIELD: &str = "nonce";
const EMAIL_FIELD: &str = "email";

/// Default token endpoint.
pub const APPLE_TOKEN_URL: &str = "https://appleid.apple.com/auth/token";
/// Default signing keys endpoint (JWKS).
pub const APPLE_CERTS_URL: &str = "https://appleid.apple.com/auth/keys";
/// Default expected issuer.
pub const APPLE_ISSUER: &str = "https://appleid.apple.com";

/// Sign in with Apple client configuration.
#[derive(Debug, Clone)]
pub struct AppleConfig {
    /// Services id used as OAuth client id.
    pub client_id: String,
    /// Client secret (a signed JWT generated out of band).
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

impl AppleConfig {
    /// Creates a configuration with Apple's public endpoints.
    ///
    /// The expected audience defaults to the client id. Keys are leased for
    /// one hour.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let client_id = client_id.into();
        Self {
            audience: client_id.clone(),
            client_id,
            client_secret: client_secret.into(),
            token_url: APPLE_TOKEN_URL.to_string(),
            certs_url: APPLE_CERTS_URL.to_string(),
            issuer: APPLE_ISSUER.to_string(),
            key_lease: KeyLease::Fixed(Duration::from_secs(3600)),
        }
    }

    /// Checks that every setting is present.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (name, value) in [
            ("apple client id", &self.client_id),
            ("apple client secret", &self.client_secret),
            ("apple token url", &self.token_url),
            ("apple certs url", &self.certs_url),
            ("apple issuer", &self.issuer),
            ("apple audience", &self.audience),
        ] {
            if value.is_empty() {
                return Err(AuthError::Configuration(format!("{name} is empty")));
            }
        }
        Ok(())
    }
}

/// Authenticates Apple users.
#[derive(Debug)]
pub struct AppleProvider {
    config: AppleConfig,
    client: Client,
    verifier: IdTokenVerifier,
}

impl AppleProvider {
    /// Creates the provider, validating the configuration.
    pub fn new(config: AppleConfig, client: Client) -> Result<Self, AuthError> {
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

/// Returns the value of `field`, which must be present but may be empty.
fn present_field<'a>(data: &'a AuthData, field: &'static str) -> Result<&'a str, AuthError> {
    data.get(field)
        .map(String::as_str)
        .ok_or(AuthError::MissingRequiredField(field))
}

#[async_trait]
impl AuthProvider for AppleProvider {
    async fn authenticate(&self, data: &AuthData) -> Result<AuthResult, AuthError> {
        // The device token is superseded by the one obtained from the exchange.
        present_field(data, IDENTITY_TOKEN_FIELD)?;
        let code = required_field(data, AUTHORIZATION_CODE_FIELD)?;
        let user_id = required_field(data, USER_ID_FIELD)?;
        let nonce = present_field(data, NONCE_FIELD)?;
        let email = present_field(data, EMAIL_FIELD)?;

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

        if claims.nonce.as_deref().unwrap_or_default() != nonce {
            return Err(VerificationFailure::Nonce.into());
        }
        if !email.is_empty() && claims.email.as_deref() != Some(email) {
            return Err(VerificationFailure::Email.into());
        }
        if claims.sub != user_id {
            warn!(sub = %claims.sub, user_id = %user_id, "Apple user id does not match token subject");
            return Err(VerificationFailure::SubjectMismatch.into());
        }

        debug!(sub = %claims.sub, "Apple identity verified");
        Ok(AuthResult::new(claims.sub))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Apple
    }
}
