// =============================================================================
// Tickerboard Main Entry Point
// =============================================================================
//
// Serves the analysis payload for a single-ticker dashboard page: daily
// candles with indicator overlays, a heuristic score and grade, headlines,
// and a generated presenter briefing.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod briefing;
mod dashboard;
mod engine;
mod providers;
mod runtime_config;

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║              Tickerboard — Starting Up                   ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override the preloaded ticker from env if available.
    if let Ok(symbol) = std::env::var("TICKERBOARD_SYMBOL") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            config.default_symbol = symbol;
        }
    }

    info!(
        default_symbol = %config.default_symbol,
        lookback = %config.lookback_range,
        news_mode = %config.news_mode,
        "Configured dashboard defaults"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr =
        std::env::var("TICKERBOARD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3700".into());
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("Service running. Press Ctrl+C to stop.");

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received, stopping gracefully");

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Tickerboard shut down complete.");
    Ok(())
}
