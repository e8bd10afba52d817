//! rproxy: host-based reverse proxy.
//!
//! Routes each request by its `Host` header to one of the configured
//! upstreams in round-robin order, failing over around unreachable ones and
//! reinstating them once they accept connections again.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rproxy::config::{load_config, validation::validate_config, ProxyConfig};
use rproxy::lifecycle::{signals, Shutdown};
use rproxy::observability::{logging, metrics};
use rproxy::{DefaultRegistry, HttpServer};

#[derive(Parser)]
#[command(name = "rproxy")]
#[command(about = "Host-based reverse proxy with upstream failover", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(rproxy::config::ConfigError::Validation)?;
    }

    if cli.check {
        println!("configuration ok: {} host(s)", config.hosts.len());
        return Ok(());
    }

    logging::init(&config.observability.log_level);
    tracing::info!("rproxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        hosts = config.hosts.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let registry = Arc::new(DefaultRegistry::from_config(&config));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if let Err(e) = signals::wait_for_shutdown_signal().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signals");
        }
        shutdown.trigger();
    });

    let server = HttpServer::new(config, registry);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
