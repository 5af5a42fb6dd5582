//! Water potability prediction server.
//!
//! Loads the fitted pipeline once at startup and serves the form page plus
//! the JSON and CSV prediction endpoints.

use anyhow::Context;
use clap::Parser;
use potability::Predictor;
use potability_server::{build_router, load_config, AppState, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve water potability predictions over HTTP.
#[derive(Parser, Debug)]
#[command(name = "potability-server", version)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "POTABILITY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(long)]
    listen_addr: Option<String>,

    /// Fitted pipeline artifact (overrides the config file)
    #[arg(long)]
    artifact: Option<PathBuf>,
}

/// Load configuration from the YAML file, if any, then apply CLI overrides.
fn resolve_config(args: &Args) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration from file");
            load_config(path)?
        }
        None => {
            info!("No config file specified, using defaults");
            ServerConfig::default()
        }
    };
    if let Some(addr) = &args.listen_addr {
        config.listen_addr = addr.clone();
    }
    if let Some(path) = &args.artifact {
        config.artifact_path = path.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let predictor = Predictor::load(&config.artifact_path)
        .with_context(|| format!("loading artifact {}", config.artifact_path.display()))?;

    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState { config, predictor });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!(%listen_addr, "Potability server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
