//! registry-proxy binary.
//!
//! ```text
//!     Client ──Host: mirantis.azurecr.io──▶ ┌───────────────┐
//!                                           │ routing table │──▶ https://mirantis.azurecr.io
//!     Client ──Host: archive.ubuntu.com───▶ │  + forwarder  │──▶ http://archive.ubuntu.com
//!                                           └───────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use registry_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use registry_proxy::lifecycle::{signals::shutdown_signal, Shutdown};
use registry_proxy::observability::{logging::init_logging, metrics::init_metrics};
use registry_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "registry-proxy")]
#[command(about = "Host-based reverse proxy for package and container registries", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in registries are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. 0.0.0.0:5000).
    #[arg(short, long)]
    bind: Option<String>,
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
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability);
    tracing::info!("registry-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        registries = config.registries.len(),
        connect_timeout_secs = config.timeouts.connect_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.wait();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
