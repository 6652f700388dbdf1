//! Authentication error types.

use passage_accounts::{AccountsError, ProviderType};
use thiserror::Error;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No provider registered for the requested type.
    #[error("provider not found: {0}")]
    ProviderNotFound(ProviderType),

    /// A field the provider needs is absent from the auth data.
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// The OAuth code exchange with the provider failed.
    #[error("provider exchange failed: {0}")]
    ProviderExchange(String),

    /// The identity token did not verify.
    #[error("token verification failed: {0}")]
    TokenVerification(#[from] VerificationFailure),

    /// A concurrent login created the account first.
    #[error("account already exists")]
    AccountAlreadyExists(#[source] AccountsError),

    /// Account resolution or creation failed for another reason.
    #[error("failed to {phase} account: {source}")]
    Account {
        /// Phase that failed (`resolve` or `create`).
        phase: &'static str,
        /// Underlying repository error.
        #[source]
        source: AccountsError,
    },

    /// Provider configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Reasons an identity token fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    /// Token could not be parsed or lacks required claims.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Token header carries no key id.
    #[error("no kid found in token header")]
    MissingKeyId,

    /// Key id is not published at the provider's certs endpoint.
    #[error("public key id '{0}' not found")]
    UnknownKeyId(String),

    /// The provider's public keys could not be fetched.
    #[error("failed to fetch public keys: {0}")]
    KeyFetch(String),

    /// Token is not signed with a supported algorithm.
    #[error("unsupported signing algorithm")]
    Algorithm,

    /// Signature does not match the published key.
    #[error("invalid signature")]
    Signature,

    /// Token has expired.
    #[error("token expired")]
    Expired,

    /// Token is not valid yet (`nbf` or `iat` in the future).
    #[error("token not yet valid")]
    NotYetValid,

    /// Issuer claim mismatch.
    #[error("invalid issuer")]
    Issuer,

    /// Audience claim mismatch.
    #[error("invalid audience")]
    Audience,

    /// Nonce claim mismatch.
    #[error("invalid nonce")]
    Nonce,

    /// Email claim mismatch.
    #[error("invalid email")]
    Email,

    /// Device-asserted user id differs from the token subject.
    #[error("user id does not match token subject")]
    SubjectMismatch,
}
