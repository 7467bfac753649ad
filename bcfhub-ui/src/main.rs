//! bcfhub-ui - BCF archive session service
//!
//! Collects uploaded BCF archives, inspects them through the external BCF
//! service and serves the aggregate issue list, selection and merge
//! download over HTTP + SSE.

use anyhow::{Context, Result};
use bcfhub_common::config::load_or_default;
use bcfhub_common::events::EventBus;
use bcfhub_ui::client::BcfServiceClient;
use bcfhub_ui::config::{CliArgs, Settings};
use bcfhub_ui::{build_router, AppState};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let (toml_config, config_source) = load_or_default(args.config.as_deref());
    let settings = Settings::resolve(&args, &toml_config);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting BCF hub (bcfhub-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("BCFHUB_GIT_HASH"),
        env!("BCFHUB_BUILD_TIMESTAMP"),
        env!("BCFHUB_BUILD_PROFILE")
    );
    config_source.log();

    if let Some(path) = &args.write_config {
        settings
            .write(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote settings to {}", path.display());
        return Ok(());
    }

    info!("BCF service: {}", settings.service_url);

    let client = Arc::new(
        BcfServiceClient::new(&settings.service_url, settings.request_timeout)
            .context("Failed to create BCF service client")?,
    );

    let event_bus = EventBus::new(settings.event_capacity);
    let state = AppState::new(event_bus, client.clone(), client, settings.limits);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = settings.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("bcfhub-ui listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
