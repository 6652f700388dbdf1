//! Identity token verification.
//!
//! Tokens are RS256 JWTs. The signing key is looked up by the header `kid`
//! in the provider's [`PublicKeyCache`]; a miss refills the cache from the
//! provider's certs endpoint once before giving up.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::keys::{self, KeyLease};
use crate::{PublicKeyCache, VerificationFailure};

/// Clock skew tolerated on `exp`, `nbf` and `iat`, in seconds.
pub const CLOCK_SKEW_SECS: u64 = 30;

/// Claims read from a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdTokenClaims {
    /// Subject: the provider's stable user id.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    #[serde(default)]
    pub iat: Option<i64>,
    /// Nonce echoed from the authorization request.
    #[serde(default)]
    pub nonce: Option<String>,
    /// Email address of the user.
    #[serde(default)]
    pub email: Option<String>,
}

/// Verifies identity tokens issued by one provider.
#[derive(Debug, Clone)]
pub struct IdTokenVerifier {
    client: Client,
    certs_url: String,
    lease: KeyLease,
    cache: Arc<PublicKeyCache>,
    validation: Validation,
}

impl IdTokenVerifier {
    /// Creates a verifier for tokens from `issuer` addressed to `audience`.
    pub fn new(
        client: Client,
        certs_url: impl Into<String>,
        issuer: &str,
        audience: &str,
        lease: KeyLease,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_SECS;
        validation.validate_nbf = true;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            client,
            certs_url: certs_url.into(),
            lease,
            cache: Arc::new(PublicKeyCache::new()),
            validation,
        }
    }

    /// Replaces the key cache, e.g. to share it with a test harness.
    pub fn with_cache(mut self, cache: Arc<PublicKeyCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The key cache backing this verifier.
    pub fn cache(&self) -> &Arc<PublicKeyCache> {
        &self.cache
    }

    /// Verifies the signature and standard claims of `token`.
    pub async fn verify(&self, token: &str) -> Result<IdTokenClaims, VerificationFailure> {
        let header = decode_header(token).map_err(map_jwt_error)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerificationFailure::Algorithm);
        }
        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(VerificationFailure::MissingKeyId)?;

        let key = self.public_key(&kid).await?;
        let claims = decode::<IdTokenClaims>(token, &key, &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        if claims.sub.is_empty() {
            return Err(VerificationFailure::Malformed("empty subject".to_string()));
        }
        if let Some(iat) = claims.iat {
            if iat > Utc::now().timestamp() + CLOCK_SKEW_SECS as i64 {
                return Err(VerificationFailure::NotYetValid);
            }
        }

        debug!(kid = %kid, sub = %claims.sub, "Identity token verified");
        Ok(claims)
    }

    async fn public_key(&self, kid: &str) -> Result<Arc<DecodingKey>, VerificationFailure> {
        if let Some(key) = self.cache.get(kid) {
            return Ok(key);
        }

        debug!(kid = %kid, url = %self.certs_url, "Public key cache miss");
        keys::refill(&self.client, &self.certs_url, self.lease, &self.cache).await?;

        self.cache
            .get(kid)
            .ok_or_else(|| VerificationFailure::UnknownKeyId(kid.to_string()))
    }
}

fn map_jwt_error(err: JwtError) -> VerificationFailure {
    match err.kind() {
        ErrorKind::InvalidSignature => VerificationFailure::Signature,
        ErrorKind::ExpiredSignature => VerificationFailure::Expired,
        ErrorKind::ImmatureSignature => VerificationFailure::NotYetValid,
        ErrorKind::InvalidIssuer => VerificationFailure::Issuer,
        ErrorKind::InvalidAudience => VerificationFailure::Audience,
        ErrorKind::InvalidAlgorithm => VerificationFailure::Algorithm,
        _ => VerificationFailure::Malformed(err.to_string()),
    }
}
