//! Capture Proxy
//!
//! A forwarding HTTP proxy that tees both directions of every exchange to disk.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ net::listener ──▶ proxy::handler ──▶ request::sniffer (host:port)
//!                                      │
//!                                      ├──▶ relay (client → origin) ──▶ <id>_req
//!                                      └──▶ relay (origin → client) ──▶ <id>_res
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use capture_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use capture_proxy::observability::{logging, metrics};
use capture_proxy::Listener;

#[derive(Parser, Debug)]
#[command(name = "capture-proxy")]
#[command(about = "Forwarding HTTP proxy that captures requests and responses", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory for capture files, overriding the configuration
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

fn resolve_config(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(dir) = &cli.capture_dir {
        config.capture.directory = dir.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);
    tracing::debug!(
        bind_address = %config.listener.bind_address,
        capture_dir = %config.capture.directory.display(),
        request_timeout_ms = config.timeouts.request_ms,
        response_timeout_ms = config.timeouts.response_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // validated above
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = match Listener::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start listener");
            return ExitCode::FAILURE;
        }
    };

    match listener.local_addr() {
        Ok(addr) => tracing::info!(address = %addr, "Listening at :{}.", addr.port()),
        Err(e) => tracing::warn!(error = %e, "Listening on an unknown address"),
    }

    listener.run(Arc::new(config)).await;
    ExitCode::SUCCESS
}
