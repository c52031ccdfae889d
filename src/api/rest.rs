// =============================================================================
// REST API Endpoints (Axum 0.7)
// =============================================================================
//
// All endpoints live under `/api/v1/`. The service renders a public page, so
// there is no authentication layer.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
//
// Failure surface per request:
//   - engine says the series is empty     -> 404 with a "no data" message
//   - history provider transport failure  -> 502 + entry in the error ring
//   - news provider failure               -> empty headline list, always 200
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::briefing::build_briefing;
use crate::dashboard::{build_dashboard, DashboardPayload};
use crate::engine::{self, EngineError, IndicatorParams};
use crate::providers::history::normalize_symbol;
use crate::providers::news::{NewsItem, NewsMode, NewsQuery};

const CONFIG_PATH: &str = "runtime_config.json";

type ApiError = (StatusCode, Json<serde_json::Value>);

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/dashboard/:symbol", get(dashboard))
        .route("/api/v1/news/:symbol", get(news))
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/config", post(set_config))
        .route("/api/v1/errors", get(recent_errors))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "server_time": chrono::Utc::now().timestamp_millis(),
        "uptime_s": state.start_time.elapsed().as_secs(),
    }))
}

// =============================================================================
// Dashboard
// =============================================================================

/// The full page payload for one ticker: metrics, chart columns, headlines,
/// and the presenter briefing.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<DashboardPayload>, ApiError> {
    let symbol = normalize_symbol(&symbol);
    let (range, limit, mode, params) = {
        let config = state.runtime_config.read();
        (
            config.lookback_range.clone(),
            config.news_limit,
            config.news_mode,
            config.indicators.clone(),
        )
    };

    // In feed mode the two fetches are independent, so they run concurrently.
    // Search mode needs the display name from the chart metadata first.
    let (history, news) = match mode {
        NewsMode::Feed => {
            let query = NewsQuery {
                symbol: symbol.clone(),
                display_name: None,
            };
            tokio::join!(
                state.chart.fetch_daily(&symbol, &range),
                fetch_news_degraded(&state, query, limit),
            )
        }
        NewsMode::Search => {
            let history = state.chart.fetch_daily(&symbol, &range).await;
            let query = NewsQuery {
                symbol: symbol.clone(),
                display_name: history
                    .as_ref()
                    .ok()
                    .and_then(|h| h.meta.display_name.clone()),
            };
            let news = fetch_news_degraded(&state, query, limit).await;
            (history, news)
        }
    };

    let history = history.map_err(|e| provider_failure(&state, &symbol, e))?;
    let analysis =
        engine::analyze(&history.series, &params).map_err(|e| engine_failure(&symbol, e))?;
    info!(
        symbol = %symbol,
        days = history.series.len(),
        score = analysis.score.score,
        grade = %analysis.score.grade,
        news = news.len(),
        "Dashboard payload built"
    );
    let briefing = build_briefing(
        &symbol,
        &history.series,
        &analysis.indicators,
        &analysis.score,
        &params,
    );

    Ok(Json(build_dashboard(
        &history.meta,
        &history.series,
        &analysis,
        news,
        briefing,
    )))
}

/// News failures never fail a page render; log and return an empty list.
async fn fetch_news_degraded(
    state: &Arc<AppState>,
    query: NewsQuery,
    limit: usize,
) -> Vec<NewsItem> {
    let provider = state.news_provider();
    match provider.fetch(&query, limit).await {
        Ok(items) => items,
        Err(e) => {
            warn!(
                symbol = %query.symbol,
                provider = provider.name(),
                error = %e,
                "News retrieval failed, rendering an empty headline list"
            );
            Vec::new()
        }
    }
}

/// Map a history-provider failure onto a 502 and record it.
fn provider_failure(state: &Arc<AppState>, symbol: &str, error: anyhow::Error) -> ApiError {
    warn!(symbol, error = %format!("{error:#}"), "History retrieval failed");
    state.push_error(format!("{symbol}: {error:#}"));
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({
            "error": "The market data provider is unavailable right now. Try again shortly.",
        })),
    )
}

/// Map an engine failure onto a response. An empty series means the symbol
/// had no usable data, which is the caller's 404, not a server fault.
fn engine_failure(symbol: &str, error: EngineError) -> ApiError {
    match error {
        EngineError::InsufficientData => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("No price data found for {symbol}. Check the ticker code."),
            })),
        ),
        other => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "error": format!("Price data for {symbol} failed validation: {other}"),
            })),
        ),
    }
}

// =============================================================================
// News panel
// =============================================================================

async fn news(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let symbol = normalize_symbol(&symbol);
    let limit = state.runtime_config.read().news_limit;
    let provider = state.news_provider();

    let query = NewsQuery {
        symbol: symbol.clone(),
        display_name: None,
    };
    let items = fetch_news_degraded(&state, query, limit).await;

    Json(serde_json::json!({
        "symbol": symbol,
        "provider": provider.name(),
        "items": items,
    }))
}

// =============================================================================
// Config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}

#[derive(Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    default_symbol: Option<String>,
    #[serde(default)]
    lookback_range: Option<String>,
    #[serde(default)]
    news_limit: Option<usize>,
    #[serde(default)]
    news_mode: Option<NewsMode>,
    #[serde(default)]
    indicators: Option<IndicatorParams>,
}

/// Apply a partial config update. Changed fields are echoed back, the file
/// is saved atomically, and a news-mode change swaps the provider.
async fn set_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    let mut changes = Vec::new();
    let mut new_mode = None;

    let config_clone = {
        let mut config = state.runtime_config.write();

        if let Some(symbol) = update.default_symbol {
            let symbol = symbol.trim().to_uppercase();
            if !symbol.is_empty() && config.default_symbol != symbol {
                changes.push(format!(
                    "default_symbol: {} -> {}",
                    config.default_symbol, symbol
                ));
                config.default_symbol = symbol;
            }
        }
        if let Some(range) = update.lookback_range {
            if config.lookback_range != range {
                changes.push(format!("lookback_range: {} -> {}", config.lookback_range, range));
                config.lookback_range = range;
            }
        }
        if let Some(limit) = update.news_limit {
            if config.news_limit != limit {
                changes.push(format!("news_limit: {} -> {}", config.news_limit, limit));
                config.news_limit = limit;
            }
        }
        if let Some(mode) = update.news_mode {
            if config.news_mode != mode {
                changes.push(format!("news_mode: {} -> {}", config.news_mode, mode));
                config.news_mode = mode;
                new_mode = Some(mode);
            }
        }
        if let Some(params) = update.indicators {
            if config.indicators != params {
                changes.push(format!(
                    "indicators: {}/{}/{} -> {}/{}/{}",
                    config.indicators.ma_window,
                    config.indicators.band_width,
                    config.indicators.rsi_window,
                    params.ma_window,
                    params.band_width,
                    params.rsi_window
                ));
                config.indicators = params;
            }
        }

        config.clone()
    };

    if let Some(mode) = new_mode {
        state.set_news_mode(mode);
    }

    if !changes.is_empty() {
        info!(changes = ?changes, "Runtime config updated via API");

        // Save to disk (best-effort).
        if let Err(e) = config_clone.save(CONFIG_PATH) {
            warn!(error = %e, "Failed to save runtime config to disk");
        }
    }

    let mut response = serde_json::to_value(&config_clone).unwrap_or_default();
    if let Some(obj) = response.as_object_mut() {
        obj.insert(
            "changes".to_string(),
            serde_json::to_value(&changes).unwrap_or_default(),
        );
    }
    Json(response)
}

// =============================================================================
// Error log
// =============================================================================

async fn recent_errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let errors = state.recent_errors.read().clone();
    Json(errors)
}
