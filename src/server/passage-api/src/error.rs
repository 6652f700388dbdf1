//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use passage_auth::AuthError;
use serde::{Deserialize, Serialize};

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Machine-readable code plus human-readable message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Stable error code.
    pub code: String,
    /// Description of the failure.
    pub message: String,
}

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested provider type is unknown or not enabled.
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// Request body could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::ProviderNotFound(_) | ApiError::Auth(AuthError::ProviderNotFound(_)) => {
                (StatusCode::NOT_FOUND, "PROVIDER_NOT_FOUND")
            },
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Auth(AuthError::MissingRequiredField(_)) => {
                (StatusCode::BAD_REQUEST, "MISSING_AUTH_DATA")
            },
            ApiError::Auth(AuthError::TokenVerification(_)) => {
                (StatusCode::UNAUTHORIZED, "TOKEN_VERIFICATION_FAILED")
            },
            ApiError::Auth(AuthError::ProviderExchange(_)) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_EXCHANGE_FAILED")
            },
            ApiError::Auth(AuthError::AccountAlreadyExists(_)) => {
                (StatusCode::CONFLICT, "ACCOUNT_ALREADY_EXISTS")
            },
            ApiError::Auth(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal error");
            "An internal error occurred".to_string()
        } else {
            tracing::debug!(code, error = %self, "Request rejected");
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
