//! # Passage API
//!
//! HTTP surface of the Passage server.
//!
//! ## Endpoints
//!
//! - `POST /v1/auth/authenticate` - Authenticate with a provider, resolving or
//!   creating the linked account
//! - `GET /v1/sys/health` - Liveness probe

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod error;
pub mod health;

use axum::routing::{get, post};
use axum::Router;
use passage_auth::AuthService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorDetails, ErrorResponse};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Authentication orchestrator.
    pub auth: AuthService,
}

impl AppState {
    /// Creates the handler state.
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/sys/health", get(health::health_check))
        .route("/v1/auth/authenticate", post(auth::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
