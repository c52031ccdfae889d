// =============================================================================
// Central Application State
// =============================================================================
//
// The single source of truth shared by every request handler. Holds the
// runtime configuration, the outbound provider clients, and a small
// operational error log for the dashboard.
//
// Thread safety:
//   - parking_lot::RwLock for all mutable shared values.
//   - The news provider sits behind an RwLock so a config change can swap
//     the strategy while requests are in flight; readers clone the Arc and
//     never hold the lock across an await.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::providers::history::ChartClient;
use crate::providers::news::{provider_for, NewsMode, NewsProvider};
use crate::runtime_config::RuntimeConfig;

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Central application state shared across handlers via `Arc<AppState>`.
pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: RwLock<RuntimeConfig>,

    // ── Outbound clients ────────────────────────────────────────────────
    pub chart: ChartClient,
    news: RwLock<Arc<dyn NewsProvider>>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration.
    /// The returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: RuntimeConfig) -> Self {
        let news = provider_for(config.news_mode);
        Self {
            runtime_config: RwLock::new(config),
            chart: ChartClient::new(),
            news: RwLock::new(news),
            recent_errors: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    /// The active news provider. Cheap Arc clone; safe to hold across awaits.
    pub fn news_provider(&self) -> Arc<dyn NewsProvider> {
        self.news.read().clone()
    }

    /// Swap the headline strategy. Requests already in flight keep the
    /// provider they cloned.
    pub fn set_news_mode(&self, mode: NewsMode) {
        *self.news.write() = provider_for(mode);
    }

    /// Record an error message. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted when the limit is
    /// reached.
    pub fn push_error(&self, message: String) {
        let record = ErrorRecord {
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }
}
