// =============================================================================
// Runtime Configuration
// =============================================================================
//
// Dashboard defaults and engine tunables, loaded from a JSON file at startup
// and adjustable over the REST API while the service runs.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::IndicatorParams;
use crate::providers::NewsMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "NVDA".to_string()
}

fn default_lookback_range() -> String {
    "1y".to_string()
}

fn default_news_limit() -> usize {
    5
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the dashboard service.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Ticker preloaded when the page opens without a query.
    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    /// Chart lookback requested from the history provider (e.g. "1y", "6mo").
    #[serde(default = "default_lookback_range")]
    pub lookback_range: String,

    /// Maximum headlines rendered in the news panel.
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    /// Active headline retrieval strategy: feed or search.
    #[serde(default)]
    pub news_mode: NewsMode,

    /// Indicator look-back windows and band width.
    #[serde(default)]
    pub indicators: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_symbol: default_symbol(),
            lookback_range: default_lookback_range(),
            news_limit: default_news_limit(),
            news_mode: NewsMode::default(),
            indicators: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            default_symbol = %config.default_symbol,
            lookback = %config.lookback_range,
            news_mode = %config.news_mode,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
