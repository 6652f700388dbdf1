//! Integration tests for the Passage server.
//!
//! Each test serves the real router on an ephemeral port and drives it over
//! HTTP, with storage and providers wired the way the server binary does it.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use passage_accounts::KvAccountsRepository;
use passage_api::AppState;
use passage_auth::{AuthService, GuestProvider, ProviderRegistry, ProviderType};
use passage_storage::{MemoryBackend, StorageBackend};
use passage_storage_sqlite::SqliteBackend;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateRequest {
    pub provider_type: String,
    pub auth_data: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateResponse {
    pub account_id: String,
    pub is_new: bool,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Result of an authentication call: success body or error envelope.
#[derive(Debug)]
pub enum AuthOutcome {
    Ok(AuthenticateResponse),
    Err(StatusCode, ErrorDetails),
}

impl AuthOutcome {
    pub fn unwrap_ok(self) -> AuthenticateResponse {
        match self {
            AuthOutcome::Ok(response) => response,
            AuthOutcome::Err(status, details) => {
                panic!("authentication failed with {status}: {details:?}")
            },
        }
    }

    pub fn unwrap_err(self) -> (StatusCode, ErrorDetails) {
        match self {
            AuthOutcome::Ok(response) => panic!("authentication unexpectedly succeeded: {response:?}"),
            AuthOutcome::Err(status, details) => (status, details),
        }
    }
}

// ============================================================================
// Test Server
// ============================================================================

/// Storage used by a [`TestServer`].
pub enum TestStorage {
    Memory,
    /// SQLite database inside the given directory.
    Sqlite(PathBuf),
}

/// A server instance listening on an ephemeral local port.
pub struct TestServer {
    handle: JoinHandle<()>,
    pub base_url: String,
    pub storage: Arc<dyn StorageBackend>,
}

impl TestServer {
    /// Starts a dev-mode server (in-memory storage, guest provider only).
    pub async fn start() -> Result<Self> {
        Self::start_with(TestStorage::Memory, |_| Ok(())).await
    }

    /// Starts a server, letting `configure` register extra providers.
    pub async fn start_with<F>(storage: TestStorage, configure: F) -> Result<Self>
    where
        F: FnOnce(&ProviderRegistry) -> Result<()>,
    {
        let backend: Arc<dyn StorageBackend> = match storage {
            TestStorage::Memory => Arc::new(MemoryBackend::new()),
            TestStorage::Sqlite(dir) => Arc::new(
                SqliteBackend::open(dir.join("accounts.db"))
                    .await
                    .context("Failed to open SQLite storage")?,
            ),
        };

        let registry = ProviderRegistry::new();
        registry.add(ProviderType::Guest, Arc::new(GuestProvider::new()));
        configure(&registry)?;

        let accounts = Arc::new(KvAccountsRepository::new(Arc::clone(&backend)));
        let service = AuthService::new(Arc::new(registry), accounts);
        let app = passage_api::router(AppState::new(service));

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .context("Failed to bind test listener")?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            handle,
            base_url: format!("http://{addr}"),
            storage: backend,
        })
    }

    /// Get a configured HTTP client for this server.
    pub fn client(&self) -> PassageClient {
        PassageClient::new(&self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Test Client
// ============================================================================

/// HTTP client for the Passage API.
pub struct PassageClient {
    client: Client,
    base_url: String,
}

impl PassageClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.client.get(self.url("/v1/sys/health")).send().await?;
        Ok(resp.json().await?)
    }

    pub async fn authenticate(
        &self,
        provider_type: &str,
        fields: &[(&str, &str)],
    ) -> Result<AuthOutcome> {
        let req = AuthenticateRequest {
            provider_type: provider_type.to_string(),
            auth_data: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let resp = self
            .client
            .post(self.url("/v1/auth/authenticate"))
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(AuthOutcome::Ok(resp.json().await?))
        } else {
            let body: ErrorResponse = resp.json().await?;
            Ok(AuthOutcome::Err(status, body.error))
        }
    }

    pub async fn guest(&self, id: &str) -> Result<AuthOutcome> {
        self.authenticate("guest", &[("id", id)]).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use tempfile::TempDir;
    use passage_auth::{GoogleConfig, GoogleProvider};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TRUSTED_PRIVATE_PEM: &str =
        include_str!("../../../src/server/passage-auth/testdata/trusted_private.pem");
    const ROGUE_PRIVATE_PEM: &str =
        include_str!("../../../src/server/passage-auth/testdata/rogue_private.pem");
    const TRUSTED_JWKS: &str =
        include_str!("../../../src/server/passage-auth/testdata/trusted_jwks.json");

    const GOOGLE_CLIENT: &str = "google-client";

    fn google_token(subject: &str, nonce: &str, private_pem: &str) -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = serde_json::json!({
            "iss": "https://accounts.google.com",
            "aud": GOOGLE_CLIENT,
            "sub": subject,
            "nonce": nonce,
            "iat": now,
            "exp": now + 600,
        });
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some("trusted-kid".to_string());
        encode(
            &header,
            &claims,
            &EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap(),
        )
        .unwrap()
    }

    /// Mock Google endpoints issuing `id_token` for any code.
    async fn google_mock(id_token: String) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "token_type": "Bearer",
                "expires_in": 3600,
                "id_token": id_token
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "public, max-age=3600")
                    .set_body_raw(TRUSTED_JWKS, "application/json"),
            )
            .mount(&server)
            .await;
        server
    }

    async fn server_with_google(mock: &MockServer) -> TestServer {
        let mut config = GoogleConfig::new(GOOGLE_CLIENT, "google-secret");
        config.token_url = format!("{}/token", mock.uri());
        config.certs_url = format!("{}/certs", mock.uri());

        TestServer::start_with(TestStorage::Memory, |registry| {
            let provider = GoogleProvider::new(config, Client::new())?;
            registry.add(ProviderType::Google, Arc::new(provider));
            Ok(())
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_server_health() {
        let server = TestServer::start().await.unwrap();
        let health = server.client().health().await.unwrap();

        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_guest_first_login_then_returning() {
        let server = TestServer::start().await.unwrap();
        let client = server.client();

        let first = client.guest("device-1").await.unwrap().unwrap_ok();
        assert!(first.is_new);

        let second = client.guest("device-1").await.unwrap().unwrap_ok();
        assert!(!second.is_new);
        assert_eq!(second.account_id, first.account_id);

        let other = client.guest("device-2").await.unwrap().unwrap_ok();
        assert!(other.is_new);
        assert_ne!(other.account_id, first.account_id);
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_providers() {
        let server = TestServer::start().await.unwrap();
        let client = server.client();

        let (status, details) = client
            .authenticate("steam", &[("id", "x")])
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(details.code, "PROVIDER_NOT_FOUND");

        let (status, details) = client
            .authenticate("apple", &[("userID", "x")])
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(details.code, "PROVIDER_NOT_FOUND");
        assert!(server.storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guest_missing_id() {
        let server = TestServer::start().await.unwrap();

        let (status, details) = server
            .client()
            .authenticate("guest", &[])
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(details.code, "MISSING_AUTH_DATA");
        assert!(details.message.contains("id"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_logins() {
        let server = TestServer::start().await.unwrap();
        let base_url = server.base_url.clone();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let client = PassageClient::new(&base_url);
                tokio::spawn(async move {
                    match client.guest("shared-device").await.unwrap() {
                        AuthOutcome::Ok(response) => response,
                        AuthOutcome::Err(status, _) => {
                            assert_eq!(status, StatusCode::CONFLICT);
                            client.guest("shared-device").await.unwrap().unwrap_ok()
                        },
                    }
                })
            })
            .collect();

        let mut responses = Vec::new();
        for handle in handles {
            responses.push(handle.await.unwrap());
        }

        assert_eq!(responses.iter().filter(|r| r.is_new).count(), 1);
        let account_id = &responses[0].account_id;
        assert!(responses.iter().all(|r| &r.account_id == account_id));

        // One identity record plus one account record.
        assert_eq!(server.storage.list("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_accounts_survive_restart_with_sqlite() {
        let dir = TempDir::new().unwrap();

        let storage = TestStorage::Sqlite(dir.path().to_path_buf());
        let first = {
            let server = TestServer::start_with(storage, |_| Ok(())).await.unwrap();
            server.client().guest("persistent").await.unwrap().unwrap_ok()
        };
        assert!(first.is_new);

        let reopened = SqliteBackend::open(dir.path().join("accounts.db")).await.unwrap();
        let keys = reopened.list("").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().any(|k| k.contains(&first.account_id)));
    }

    #[tokio::test]
    async fn test_google_end_to_end() {
        let mock = google_mock(google_token("google-sub", "n-1", TRUSTED_PRIVATE_PEM)).await;
        let server = server_with_google(&mock).await;
        let client = server.client();

        let fields = [("token", "server-auth-code"), ("nonce", "n-1")];
        let first = client.authenticate("google", &fields).await.unwrap().unwrap_ok();
        assert!(first.is_new);

        let second = client.authenticate("google", &fields).await.unwrap().unwrap_ok();
        assert!(!second.is_new);
        assert_eq!(second.account_id, first.account_id);
    }

    #[tokio::test]
    async fn test_google_nonce_mismatch_creates_no_account() {
        let mock = google_mock(google_token("google-sub", "issued-nonce", TRUSTED_PRIVATE_PEM)).await;
        let server = server_with_google(&mock).await;

        let (status, details) = server
            .client()
            .authenticate("google", &[("token", "server-auth-code"), ("nonce", "client-nonce")])
            .await
            .unwrap()
            .unwrap_err();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(details.code, "TOKEN_VERIFICATION_FAILED");
        assert!(server.storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_google_forged_token_creates_no_account() {
        let mock = google_mock(google_token("victim", "n", ROGUE_PRIVATE_PEM)).await;
        let server = server_with_google(&mock).await;

        let (status, details) = server
            .client()
            .authenticate("google", &[("token", "server-auth-code")])
            .await
            .unwrap()
            .unwrap_err();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(details.code, "TOKEN_VERIFICATION_FAILED");
        assert!(server.storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_google_exchange_failure() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&mock)
            .await;
        let server = server_with_google(&mock).await;

        let (status, details) = server
            .client()
            .authenticate("google", &[("token", "expired-code")])
            .await
            .unwrap()
            .unwrap_err();

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(details.code, "PROVIDER_EXCHANGE_FAILED");
    }
}
