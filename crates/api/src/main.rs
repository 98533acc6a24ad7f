//! AutoMed API server binary.
//!
//! Usage:
//!   automed-api --config automed.toml
//!   automed-api --port 8080 --bind 0.0.0.0
//!   automed-api --log-format json --log-file logs/app.log

use automed_api::{AppState, LogFormat, init_tracing, serve};
use automed_coordinator::CoordinatorConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// AutoMed diagnosis API server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "AUTOMED_PORT", default_value_t = 8000)]
    port: u16,

    /// Bind address
    #[arg(short, long, env = "AUTOMED_BIND_ADDR", default_value = "127.0.0.1")]
    bind: String,

    /// Path to a coordinator TOML config
    #[arg(short, long, env = "AUTOMED_CONFIG")]
    config: Option<PathBuf>,

    /// Stdout log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Also append JSON logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.log_format, args.log_file.as_deref())?;

    if args.bind == "0.0.0.0" {
        tracing::warn!("Server binding to 0.0.0.0, exposing the API on all network interfaces");
    }

    let config = match &args.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            CoordinatorConfig::from_file(path)?
        }
        None => {
            tracing::info!("Using default configuration");
            CoordinatorConfig::default()
        }
    };

    tracing::info!("Starting AutoMed application");
    let state = AppState::new(config).await?;

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    serve(Arc::new(state), addr).await?;

    Ok(())
}
