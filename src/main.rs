//! Link-rewriting forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser                         LINK PROXY                              Origin
//!                  ┌──────────────────────────────────────────────┐
//!  GET /{domain}/p │  ┌────────┐   ┌────────┐   hit               │
//!  ───────────────▶│  │ target │──▶│ cache  │───────────┐         │
//!                  │  │ decode │   └───┬────┘           │         │
//!                  │  └────────┘       │ miss           │         │
//!                  │                   ▼                │         │  GET {scheme}://{domain}/p
//!                  │              ┌─────────┐           │         │ ─────────────────────────▶
//!                  │              │ forward │◀──────────┼─────────┼───────────────────────────
//!                  │              └────┬────┘           │         │
//!                  │         text/html │ other          │         │
//!                  │                   ▼                │         │
//!                  │   ┌──────────────────────────┐     │         │
//!                  │   │ rewrite a/link/img/script│     │         │
//!                  │   └────────────┬─────────────┘     │         │
//!                  │                ▼                   │         │
//!  ◀───────────────│           cache store ─────────────┘         │
//!                  └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use link_proxy::config::loader::load_config;
use link_proxy::config::ProxyConfig;
use link_proxy::http::HttpServer;
use link_proxy::lifecycle::{wait_for_signal, Shutdown};
use link_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "link-proxy", version)]
#[command(about = "Forwarding proxy that rewrites HTML links back through itself", long_about = None)]
struct Cli {
    /// Port to listen on (overrides the config file).
    #[arg(short, long, env = "LINK_PROXY_PORT")]
    port: Option<u16>,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    if let Some(port) = cli.port {
        config.listener.set_port(port)?;
    }

    logging::init_logging(&config.observability);

    tracing::info!("link-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_timeout_secs = config.upstream.timeout_secs,
        max_body_bytes = config.upstream.max_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config)?;

    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
