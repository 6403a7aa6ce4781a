//! Backend entry point.
//!
//! Resolves configuration (CLI > environment > config file > defaults),
//! initializes tracing, binds the listener and serves until SIGINT/SIGTERM.
//! Any startup failure, such as the port already being in use, exits non-zero.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backend::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER};
use backend::{create_router, start_server};

/// Backend: a minimal HTTP server with a health check
#[derive(Parser, Debug)]
#[command(name = "backend", version, about)]
struct Args {
    /// Path to configuration file (default: config/default.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level filter (e.g., "backend=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_tracing(filter: &str, format: LogFormat) {
    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(filter));

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = AppConfig::resolve(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    // Tracing priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    init_tracing(&log_filter, config.logging.format);

    tracing::debug!(
        host = %config.http.host,
        port = config.http.port,
        "Loaded configuration"
    );

    let server = match start_server(create_router(), &config.http).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start server");
            return Err(e.into());
        }
    };

    server.wait().await?;

    Ok(())
}
