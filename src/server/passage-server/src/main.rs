//! Passage Server - Main entry point.

mod config;

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use passage_accounts::KvAccountsRepository;
use passage_api::AppState;
use passage_auth::{
    AppleProvider, AuthService, GoogleProvider, GuestProvider, ProviderRegistry, ProviderType,
};
use passage_storage::{MemoryBackend, StorageBackend};
use passage_storage_sqlite::SqliteBackend;
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    tracing::info!("Starting Passage server...");
    tracing::info!(bind = %cli.bind, "Bind address");

    let storage = open_storage(&cli).await?;
    let registry = Arc::new(build_registry(&cli)?);
    tracing::info!(providers = ?registry.registered(), "Identity providers ready");

    let accounts = Arc::new(KvAccountsRepository::new(storage));
    let service = AuthService::new(registry, accounts);
    let app = passage_api::router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "Passage server listening");

    let shutdown = Arc::new(Notify::new());
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown({
                let shutdown = Arc::clone(&shutdown);
                async move { shutdown.notified().await }
            })
            .into_future(),
    );

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    shutdown.notify_one();
    match tokio::time::timeout(cli.shutdown_timeout(), server).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(
            timeout_secs = cli.shutdown_timeout_secs,
            "Shutdown grace period elapsed, dropping in-flight requests"
        ),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn open_storage(cli: &Cli) -> anyhow::Result<Arc<dyn StorageBackend>> {
    if cli.dev {
        tracing::warn!("Development mode enabled - accounts are kept in memory only");
        return Ok(Arc::new(MemoryBackend::new()));
    }

    let path = cli.database_path();
    let backend = SqliteBackend::open(&path)
        .await
        .with_context(|| format!("failed to open accounts database {}", path.display()))?;
    tracing::info!(path = %path.display(), "Accounts database opened");
    Ok(Arc::new(backend))
}

fn build_registry(cli: &Cli) -> anyhow::Result<ProviderRegistry> {
    let client = reqwest::Client::builder()
        .timeout(cli.http_timeout())
        .build()
        .context("failed to build HTTP client")?;

    let registry = ProviderRegistry::new();
    registry.add(ProviderType::Guest, Arc::new(GuestProvider::new()));

    if let Some(config) = cli.google_config() {
        let provider = GoogleProvider::new(config, client.clone())?;
        registry.add(ProviderType::Google, Arc::new(provider));
    }
    if let Some(config) = cli.apple_config() {
        let provider = AppleProvider::new(config, client)?;
        registry.add(ProviderType::Apple, Arc::new(provider));
    }

    Ok(registry)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Graceful shutdown initiated");
}
