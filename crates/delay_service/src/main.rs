//! Flight delay prediction service entry point

use anyhow::{Context, Result};
use clap::Parser;
use flightdelay_service::{serve, AppState, ServiceConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "delay-service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP prediction service for the flight delay classifier", long_about = None)]
struct Cli {
    /// TOML config file (overrides $DELAY_SERVICE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Artifact JSON path
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// JSON-lines prediction log
    #[arg(long)]
    prediction_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!("Starting flight delay service v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        ServiceConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(model_path) = cli.model_path {
        config.model_path = model_path;
    }
    if let Some(prediction_log) = cli.prediction_log {
        config.prediction_log = Some(prediction_log);
    }

    let state = AppState::from_config(&config);
    if !state.predictor.is_available() {
        error!(
            path = %config.model_path.display(),
            "model unavailable; /predict will answer 503 until restarted with a valid artifact"
        );
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    serve(listener, state, shutdown_signal()).await?;

    info!("Service shutdown complete");
    Ok(())
}

fn init_logging() {
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(env)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await
        }
    }
}
