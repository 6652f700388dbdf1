//! Authentication endpoint.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use passage_auth::{AuthData, AuthenticateInput, AuthenticateOutput, ProviderType};
use serde::Deserialize;

use crate::{ApiError, AppState};

/// Authentication request body.
///
/// `provider_type` is taken as a plain string so unknown providers map to
/// `404` instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    /// Provider tag (`guest`, `google`, `apple`).
    pub provider_type: String,
    /// Provider-defined credential fields.
    #[serde(default)]
    pub auth_data: AuthData,
}

/// Authenticates a player and returns the linked account.
pub async fn authenticate(
    State(state): State<AppState>,
    body: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<Json<AuthenticateOutput>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    let provider_type = ProviderType::from_str(&request.provider_type)
        .map_err(|_| ApiError::ProviderNotFound(request.provider_type.clone()))?;

    let input = AuthenticateInput {
        provider_type,
        auth_data: request.auth_data,
    };

    let output = state.auth.authenticate(&input).await?;
    Ok(Json(output))
}
