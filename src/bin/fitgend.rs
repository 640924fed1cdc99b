//! fitgend: fitness assistant HTTP daemon.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use fitgen::FitgenError;
use fitgen::server::{self, AppState, Config, Secrets, Service};

/// Fitness assistant API server.
#[derive(Parser)]
#[command(name = "fitgend")]
#[command(version = fitgen::version::PKG_VERSION)]
#[command(about = "Fitness planning API backed by generative models")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the configuration file.
    #[arg(short, long, env = "FITGEN_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fitgen=info,fitgend=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.server.address = address;
    }
    let secrets = Secrets::load()?;

    for (service, name) in [
        (Service::Gemini, "gemini"),
        (Service::OpenAi, "speech"),
        (Service::Pexels, "images"),
    ] {
        if secrets.api_key(service).is_none() {
            warn!(service = name, "no API key configured, endpoints using it will fail");
        }
    }

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| FitgenError::Configuration(format!("Invalid address: {e}")))?;

    let state = AppState::new(config, secrets)?;
    let app = server::router(state);

    info!(version = fitgen::version::version_string(), %addr, "fitgend starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        })
        .await?;

    Ok(())
}
