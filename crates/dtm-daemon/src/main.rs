//! # dtm-daemon
//!
//! Design-token governance daemon.
//!
//! Serves the governance API (guarded saves, backup history, restores,
//! reference validation, workspace provisioning) over HTTP for editors and
//! build tools working on the same token tree.
//!
//! ## Usage
//!
//! ```text
//! dtm-daemon --project-root ./design-system
//! dtm-daemon --project-root . --bind 0.0.0.0:4310 --log-json
//! ```
//!
//! State lives under `<project-root>/.dtm/`; see [`DaemonConfig`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dtm_daemon::{router, DaemonConfig, GovernanceStore};

/// Design-token governance daemon.
#[derive(Parser)]
#[command(name = "dtm-daemon", version, about = "Design-token governance daemon")]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Config file (defaults to <project-root>/.dtm/daemon.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file.
    #[arg(long)]
    bind: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env()
        .add_directive("dtm_daemon=info".parse()?)
        .add_directive("dtm_guard=info".parse()?)
        .add_directive("dtm_workspace=info".parse()?)
        .add_directive("tower_http=info".parse()?);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.with_ansi(false).init();
    }

    let project_root = cli
        .project_root
        .canonicalize()
        .with_context(|| format!("project root {} not found", cli.project_root.display()))?;

    tracing::info!("Starting design-token governance daemon");
    tracing::info!("Project root: {}", project_root.display());

    let mut config = DaemonConfig::load(&project_root, cli.config.as_deref())?;
    if let Some(bind) = &cli.bind {
        config.set_bind(bind)?;
    }
    let bind = config.bind;

    let state = GovernanceStore::open(config)?.into_state();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Daemon shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
