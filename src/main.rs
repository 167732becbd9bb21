// Prediction Market Settlement Engine - Main Entry Point

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prediction_market::config::DEFAULT_LOG_FILTER;
use prediction_market::{router, AppState, EngineConfig, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().map_err(anyhow::Error::msg)?;
    init_tracing();

    info!("🎲 Prediction Market Settlement Engine");

    let state: SharedState = Arc::new(AppState::new(config.clone()).map_err(anyhow::Error::msg)?);
    let shutdown_state = state.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "🚀 Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("💾 Saving state to disk...");
    if let Err(e) = shutdown_state.save_to_disk() {
        error!("❌ Failed to save state: {}", e);
    }
    info!("👋 Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        return;
    }
    info!("🛑 Shutdown signal received");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
