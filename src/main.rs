//! Host server with the admin mounted at its base URL.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ host axum router ──▶ /health
//!                          │
//!                          ▼  (below the mount path)
//!                     AdminMount::forward
//!                          │  fork scope, restore mount path
//!                          ▼
//!                     PathFix ──▶ outer router ──▶ admin site
//!                                                  │ auth, views, forms
//!     Client Response                              ▼
//!     ◀────────────── streamed gateway response events
//! ```

use clap::Parser;
use std::path::PathBuf;

use admin_mount::config::{load_config, ServerConfig};
use admin_mount::lifecycle::{startup, wait_for_signal, Shutdown, Started};
use admin_mount::observability::init_logging;

#[derive(Parser)]
#[command(name = "admin-mount")]
#[command(about = "Serve a host application with the admin mounted into it", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;
    tracing::info!("admin-mount v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        config_file = ?cli.config,
        "Configuration loaded"
    );

    let Started {
        admin,
        server,
        listener,
    } = startup(config).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        admin = %admin.admin().base_url(),
        views = admin.admin().views().len(),
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    let serving = tokio::spawn(server.run(listener, stopped));

    wait_for_signal().await?;
    shutdown.trigger();
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
