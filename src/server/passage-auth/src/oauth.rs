//! OAuth 2.0 authorization code exchange.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::AuthError;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token issued by the provider.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type, usually `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Refresh token, if granted.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// OpenID Connect identity token.
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client credentials for a token endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ClientCredentials<'a> {
    /// OAuth client id.
    pub client_id: &'a str,
    /// OAuth client secret.
    pub client_secret: &'a str,
}

/// Exchanges an authorization code for tokens and returns the identity token.
#[instrument(skip_all, fields(url = %token_url))]
pub async fn exchange_authorization_code(
    client: &Client,
    token_url: &str,
    credentials: ClientCredentials<'_>,
    code: &str,
) -> Result<String, AuthError> {
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", credentials.client_id),
        ("client_secret", credentials.client_secret),
        ("redirect_uri", ""),
    ];

    let response = client
        .post(token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::ProviderExchange(e.to_string()))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| AuthError::ProviderExchange(e.to_string()))?;

    if !status.is_success() {
        let reason = match serde_json::from_slice::<ErrorResponse>(&body) {
            Ok(ErrorResponse {
                error,
                error_description: Some(description),
            }) => format!("{error}: {description}"),
            Ok(ErrorResponse { error, .. }) => error,
            Err(_) => format!("token endpoint returned {status}"),
        };
        warn!(%status, reason = %reason, "Authorization code exchange rejected");
        return Err(AuthError::ProviderExchange(reason));
    }

    let tokens: TokenResponse = serde_json::from_slice(&body)
        .map_err(|e| AuthError::ProviderExchange(format!("invalid token response: {e}")))?;

    debug!("Authorization code exchanged");

    tokens
        .id_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::ProviderExchange("token response has no id_token".to_string()))
}
