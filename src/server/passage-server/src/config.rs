//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use passage_auth::{AppleConfig, GoogleConfig};

/// Passage server configuration.
///
/// Every flag can also be set through its `PASSAGE_*` environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "passage-server")]
#[command(about = "Passage - player authentication and account resolution server")]
#[command(version)]
pub struct Cli {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8090", env = "PASSAGE_BIND_ADDRESS")]
    pub bind: String,

    /// Directory holding the accounts database
    #[arg(long, default_value = "data", env = "PASSAGE_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Enable development mode (in-memory storage)
    #[arg(long, env = "PASSAGE_DEV_MODE")]
    pub dev: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info", env = "PASSAGE_LOG_LEVEL")]
    pub log_level: String,

    /// Timeout for calls to identity providers, in milliseconds
    #[arg(long, default_value_t = 2000, env = "PASSAGE_HTTP_TIMEOUT_MS")]
    pub http_timeout_ms: u64,

    /// Grace period for in-flight requests on shutdown, in seconds
    #[arg(long, default_value_t = 30, env = "PASSAGE_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,

    #[command(flatten)]
    pub google: GoogleArgs,

    #[command(flatten)]
    pub apple: AppleArgs,
}

/// Google provider settings.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GoogleArgs {
    /// Google OAuth client id
    #[arg(id = "google_client_id", long = "google-client-id", env = "PASSAGE_GOOGLE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Google OAuth client secret
    #[arg(id = "google_client_secret", long = "google-client-secret", env = "PASSAGE_GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Google token endpoint
    #[arg(id = "google_token_url", long = "google-token-url", env = "PASSAGE_GOOGLE_TOKEN_URL")]
    pub token_url: Option<String>,

    /// Google signing keys endpoint
    #[arg(id = "google_certs_url", long = "google-certs-url", env = "PASSAGE_GOOGLE_CERTS_URL")]
    pub certs_url: Option<String>,

    /// Expected id token issuer
    #[arg(id = "google_issuer", long = "google-issuer", env = "PASSAGE_GOOGLE_ISSUER")]
    pub issuer: Option<String>,

    /// Expected id token audience (defaults to the client id)
    #[arg(id = "google_audience", long = "google-audience", env = "PASSAGE_GOOGLE_AUDIENCE")]
    pub audience: Option<String>,
}

/// Apple provider settings.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct AppleArgs {
    /// Apple services id
    #[arg(id = "apple_client_id", long = "apple-client-id", env = "PASSAGE_APPLE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Apple client secret JWT
    #[arg(id = "apple_client_secret", long = "apple-client-secret", env = "PASSAGE_APPLE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Apple token endpoint
    #[arg(id = "apple_token_url", long = "apple-token-url", env = "PASSAGE_APPLE_TOKEN_URL")]
    pub token_url: Option<String>,

    /// Apple signing keys endpoint
    #[arg(id = "apple_certs_url", long = "apple-certs-url", env = "PASSAGE_APPLE_CERTS_URL")]
    pub certs_url: Option<String>,

    /// Expected id token issuer
    #[arg(id = "apple_issuer", long = "apple-issuer", env = "PASSAGE_APPLE_ISSUER")]
    pub issuer: Option<String>,

    /// Expected id token audience (defaults to the client id)
    #[arg(id = "apple_audience", long = "apple-audience", env = "PASSAGE_APPLE_AUDIENCE")]
    pub audience: Option<String>,
}

/// Returns the pair only if both values are present and non-empty.
fn credentials(id: &Option<String>, secret: &Option<String>) -> Option<(String, String)> {
    match (id.as_deref(), secret.as_deref()) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
            Some((id.to_string(), secret.to_string()))
        },
        _ => None,
    }
}

fn override_with(target: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        *target = value.to_string();
    }
}

impl Cli {
    /// Outbound HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Shutdown grace period.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Path of the SQLite accounts database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("accounts.db")
    }

    /// Google configuration, if the provider is enabled.
    pub fn google_config(&self) -> Option<GoogleConfig> {
        let args = &self.google;
        let (id, secret) = credentials(&args.client_id, &args.client_secret)?;
        let mut config = GoogleConfig::new(id, secret);
        override_with(&mut config.token_url, &args.token_url);
        override_with(&mut config.certs_url, &args.certs_url);
        override_with(&mut config.issuer, &args.issuer);
        override_with(&mut config.audience, &args.audience);
        Some(config)
    }

    /// Apple configuration, if the provider is enabled.
    pub fn apple_config(&self) -> Option<AppleConfig> {
        let args = &self.apple;
        let (id, secret) = credentials(&args.client_id, &args.client_secret)?;
        let mut config = AppleConfig::new(id, secret);
        override_with(&mut config.token_url, &args.token_url);
        override_with(&mut config.certs_url, &args.certs_url);
        override_with(&mut config.issuer, &args.issuer);
        override_with(&mut config.audience, &args.audience);
        Some(config)
    }
}
