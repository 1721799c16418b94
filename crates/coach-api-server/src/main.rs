use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use coach_api_server::auth::{KeyCache, TokenVerifier};
use coach_api_server::config::Settings;
use coach_api_server::database::{DbPool, DocumentStore, MemoryStore, PgStore};
use coach_api_server::services::{GeminiService, LlmProvider};
use coach_api_server::utils::Limiters;
use coach_api_server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coach_api_server=debug".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .init();

    info!("🚀 Starting Coach API Server...");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("✅ Configuration loaded");

    // Key cache stays empty until the first token needs a key
    let key_cache = Arc::new(KeyCache::new(
        settings.jwks_url(),
        Duration::from_secs(settings.auth.jwks_timeout_seconds),
    ));
    let verifier = Arc::new(
        TokenVerifier::new(key_cache, &settings.auth.domain, settings.auth.client_id.clone())
            .reject_unverified(settings.auth.reject_unverified),
    );
    if !settings.auth.reject_unverified {
        warn!("Tokens without a verifiable signature will be accepted");
    }

    // Document store
    let store: Arc<dyn DocumentStore> = match settings.database.url.as_deref() {
        Some(url) => {
            let pool = DbPool::new(url, &settings.database).await?;
            let store = PgStore::new(pool);
            store.ensure_schema().await?;
            info!("✅ Database connection established");
            Arc::new(store)
        }
        None => {
            warn!("No database URL configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Generation backend
    let limiters = Arc::new(Limiters::new(&settings.limits));
    let llm: Arc<dyn LlmProvider> = Arc::new(GeminiService::new(settings.gemini.clone(), limiters));
    if settings.gemini.api_key.is_empty() {
        warn!("Gemini API key is empty; generation requests will fail");
    }
    info!("✅ Generation backend: {}", llm.model());

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let app = build_router(AppState::new(settings, verifier, store, llm));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
