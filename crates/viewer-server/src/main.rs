//! CLI entry point for the earnings results viewer.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use viewer_core::ServerConfig;
use viewer_server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "earnings-viewer")]
#[command(about = "Offline viewer for earnings-call result datasets and the knowledge graph")]
struct Cli {
    /// Config file prefix (default: viewer).
    #[arg(short, long, default_value = "viewer")]
    config: String,

    /// Override the listen address (e.g., 0.0.0.0:8000).
    #[arg(long)]
    bind: Option<String>,

    /// Override the dataset directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    std::fs::create_dir_all(&config.data_dir)?;
    let state = AppState::from_config(&config)?;
    let router = build_router(state, Some(&config.static_dir));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        "Viewer listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Viewer shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
