use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use therapy_sessions::{create_router, AppState, Config, GeminiClient, MemoryStore};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "therapy-sessions", version, about = "Therapy session and insight service")]
struct Args {
    /// Config file path (without extension)
    #[arg(long, default_value = "config/therapy-sessions")]
    config: String,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Therapy Sessions v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    if let Err(e) = cfg.voice.validate() {
        warn!("Voice calls unavailable until configured: {}", e);
    }

    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(GeminiClient::new(&cfg.generation)?);
    info!("Generation model: {}", generator.model());
    let state = AppState::new(store, generator, cfg.voice.clone());

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
