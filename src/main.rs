//! forward-fetch: fetch URLs through a gRPC forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   forward-fetch URL...
//!        │
//!        ▼
//!   ┌──────────────────────────── ForwardProxyManager ─────────────────────────────┐
//!   │  admission gate ──▶ retry loop ──▶ connection holder ──▶ dispatcher          │
//!   │   (semaphore)        (linear        (one memoized          (SendRequest,     │
//!   │                       backoff)       handshake)             cancellation)    │
//!   └─────────────────────────────────────────────┬────────────────────────────────┘
//!                                                 │ gRPC (HTTP/2)
//!                                                 ▼
//!                                          forward proxy ──▶ upstream hosts
//! ```

use clap::Parser;
use futures_util::future::join_all;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use forward_proxy_client::config::{load_config, validate_config, ClientConfig, ConfigError};
use forward_proxy_client::observability::{logging, metrics};
use forward_proxy_client::{lifecycle, ForwardProxyManager, ProxyResult, RequestOptions};

#[derive(Parser)]
#[command(name = "forward-fetch")]
#[command(about = "Fetch URLs through a gRPC forward proxy", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proxy endpoint, overrides the config file
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Priority hint forwarded to the proxy
    #[arg(short, long)]
    priority: Option<i64>,

    /// Upstream status code the proxy should retry on (repeatable)
    #[arg(long = "retry-on", value_name = "CODE")]
    retry_on: Vec<u16>,

    /// Retries after a connection failure, overrides the config file
    #[arg(long)]
    max_retries: Option<u32>,

    /// Print status and size instead of the body, and accept any status
    #[arg(long)]
    raw: bool,

    /// URLs to fetch
    #[arg(required = true)]
    urls: Vec<String>,
}

fn build_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.proxy.endpoint = endpoint.clone();
    }
    if let Some(max_retries) = cli.max_retries {
        config.client.max_retries = max_retries;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Error: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        endpoint = %config.proxy.endpoint,
        semaphore = config.client.semaphore,
        max_retries = config.client.max_retries,
        client_timeout_ms = config.client.client_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let manager = ForwardProxyManager::new(config);
    let cancel = CancellationToken::new();
    let signals = lifecycle::cancel_on_ctrl_c(cancel.clone());

    let options = RequestOptions {
        priority: cli.priority,
        retry_on_codes: cli.retry_on.clone(),
        cancel: Some(cancel.clone()),
    };

    let results = join_all(
        cli.urls
            .iter()
            .map(|url| fetch_one(&manager, url, options.clone(), cli.raw)),
    )
    .await;

    cancel.cancel();
    let _ = signals.await;

    let mut failed = false;
    for (url, result) in cli.urls.iter().zip(results) {
        match result {
            Ok(output) => println!("{}", output),
            Err(e) => {
                failed = true;
                eprintln!("{}: {}", url, e);
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn fetch_one(
    manager: &ForwardProxyManager,
    url: &str,
    options: RequestOptions,
    raw: bool,
) -> ProxyResult<String> {
    if raw {
        let response = manager.request(url, options).await?;
        Ok(format!("{} {} ({} bytes)", url, response.status_code, response.body.len()))
    } else {
        manager.fetch_text(url, options).await
    }
}
