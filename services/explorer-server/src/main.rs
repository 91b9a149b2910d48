//! Scene explorer server.
//!
//! Serves a scene folder on `--listen` and records label edits posted by the
//! explorer. Edited labels are written back to `labels.json` on shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use explorer_server::{create_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "explorer-server")]
#[command(about = "Serve a scene folder and persist explorer labels")]
struct Args {
    /// Listen address
    #[arg(long, env = "EXPLORER_LISTEN", default_value = "127.0.0.1:9009")]
    listen: String,

    /// Scene folder to serve
    #[arg(long, env = "SCENE_FOLDER", default_value = ".")]
    folder: PathBuf,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Do not advertise the label endpoint
    #[arg(long)]
    no_labels: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    info!(folder = %args.folder.display(), "Starting scene explorer server");

    let state = Arc::new(
        AppState::open(&args.folder, !args.no_labels)
            .with_context(|| format!("cannot serve {}", args.folder.display()))?,
    );
    let app = create_router(state.clone(), Some(prometheus_handle));

    // Shutdown signal
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal");
        shutdown_tx.send(()).ok();
    });

    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, labels = state.labels_enabled(), "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
        })
        .await?;

    if let Err(e) = state.save_labels().await {
        error!(error = %e, path = %state.labels_path().display(), "Failed to save labels");
        return Err(e.into());
    }
    Ok(())
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.ok();
}
