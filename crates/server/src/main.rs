//! quire server entry point.
//!
//! Boots the HTTP server, loads content once (fatal on failure), then keeps
//! content fresh through SIGHUP and the deploy webhook.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quire_core::{AppConfig, Store};
use tracing_subscriber::EnvFilter;

use crate::reload::{DiskLoader, GitPuller, Trigger};
use crate::state::AppState;

mod error;
mod notify;
mod reload;
mod routes;
mod state;
mod webhook;

#[derive(Debug, Parser)]
#[command(name = "quire", version, about = "Self-hosted publishing engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the site (default).
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
    }
}

async fn serve() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let addr = config.socket_addr()?;

    let store = Store::open(&config.db_path)
        .await
        .with_context(|| format!("opening database at {}", config.db_path.display()))?;
    let notifier = notify::from_config(&config);
    let loader = Arc::new(DiskLoader::new(&config.content_dir));
    let puller = Arc::new(GitPuller::new(&config.content_dir, config.pull_timeout()));
    let state = Arc::new(AppState::new(config, store, loader, puller, notifier));

    state.reloader.reload(Trigger::Startup).await.context("initial content load")?;

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(state.reloader.clone()));

    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "quire listening");

    let app = routes::build_router(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("quire stopped");
    Ok(())
}

/// Forward SIGHUP to the reloader. Signals arriving during a reload collapse
/// into one follow-up reload.
#[cfg(unix)]
async fn reload_on_hangup(reloader: Arc<reload::Reloader>) {
    use tokio::signal::unix::{SignalKind, signal};
    use tokio::sync::mpsc;

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::error!(error = %err, "cannot listen for SIGHUP, signal reloads disabled");
            return;
        }
    };

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move { reloader.run_signal_reloads(rx).await });
    while hangup.recv().await.is_some() {
        if tx.try_send(()).is_err() {
            tracing::debug!("SIGHUP received, reload already pending");
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutting down");
}
