// =============================================================================
// Chart API Client (daily price history)
// =============================================================================
//
// Fetches daily OHLCV candles plus display metadata from the public v8
// chart endpoint. The upstream payload is columnar with null holes for
// halted or partial days; this module flattens it into a validated
// `PriceSeries` and keeps every wire-format detail private.
//
// Failure contract: an unknown symbol is *not* an error. The endpoint
// reports it inside the payload (or returns zero rows), and both cases
// resolve to an empty series so the engine raises its own insufficient-data
// failure. Transport errors and unparseable payloads stay hard errors.

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::engine::{PricePoint, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// --- wire format -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    currency: Option<String>,
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

// --- public types ------------------------------------------------------------

/// Display metadata for a symbol. Cosmetic only; the engine never reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMeta {
    pub symbol: String,
    pub currency: String,
    pub display_name: Option<String>,
}

impl SymbolMeta {
    /// Placeholder metadata for a symbol the endpoint did not recognise.
    pub fn unknown(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            currency: "USD".to_string(),
            display_name: None,
        }
    }

    /// Currency sign for the metric cards.
    pub fn currency_sign(&self) -> &'static str {
        match self.currency.as_str() {
            "KRW" => "\u{20a9}",
            "JPY" => "\u{a5}",
            "EUR" => "\u{20ac}",
            "GBP" => "\u{a3}",
            _ => "$",
        }
    }
}

/// Daily history plus the symbol's display metadata.
#[derive(Debug, Clone)]
pub struct MarketHistory {
    pub meta: SymbolMeta,
    pub series: PriceSeries,
}

/// Uppercase the symbol and swap share-class dots for hyphens
/// ("brk.b" becomes "BRK-B").
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

// --- client ------------------------------------------------------------------

pub struct ChartClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChartClient {
    pub fn new() -> Self {
        Self {
            client: super::http_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Fetch daily candles for `symbol` over `range` (e.g. "1y", "6mo").
    pub async fn fetch_daily(&self, symbol: &str, range: &str) -> Result<MarketHistory> {
        let symbol = normalize_symbol(symbol);
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d&includePrePost=false",
            self.base_url, symbol, range
        );
        debug!(symbol = %symbol, range, "Fetching daily history");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Chart request for {} failed", symbol))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read chart response body")?;

        // The endpoint reports unknown symbols as a JSON error payload with a
        // non-success status, so try to parse the body before giving up on
        // the status code.
        let parsed: ChartResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                anyhow::bail!("Chart API error {}: {}", status, truncate(&body, 200));
            }
            Err(e) => return Err(e).context("Failed to parse chart response"),
        };

        build_history(&symbol, parsed)
    }
}

impl Default for ChartClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten a parsed chart response into a `MarketHistory`.
///
/// Rows are dropped when the timestamp is unusable or any OHLC field is
/// missing or the close is non-positive. Missing volume becomes zero.
fn build_history(symbol: &str, response: ChartResponse) -> Result<MarketHistory> {
    if let Some(err) = response.chart.error {
        warn!(
            symbol,
            code = %err.code,
            description = %err.description,
            "Chart API reported an error, treating as no data"
        );
        return Ok(MarketHistory {
            meta: SymbolMeta::unknown(symbol),
            series: PriceSeries::empty(),
        });
    }

    let Some(result) = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
    else {
        return Ok(MarketHistory {
            meta: SymbolMeta::unknown(symbol),
            series: PriceSeries::empty(),
        });
    };

    let meta = SymbolMeta {
        symbol: result.meta.symbol.clone(),
        currency: result.meta.currency.unwrap_or_else(|| "USD".to_string()),
        display_name: result.meta.short_name.or(result.meta.long_name),
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(MarketHistory {
            meta,
            series: PriceSeries::empty(),
        });
    };

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let close = match closes.get(i).copied().flatten() {
            Some(c) if c > 0.0 => c,
            _ => continue,
        };
        let (Some(open), Some(high), Some(low)) = (
            opens.get(i).copied().flatten(),
            highs.get(i).copied().flatten(),
            lows.get(i).copied().flatten(),
        ) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        points.push(PricePoint {
            date,
            open,
            high,
            low,
            close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0) as f64,
        });
    }

    let series = PriceSeries::from_points(points)
        .with_context(|| format!("Chart API returned an invalid series for {}", symbol))?;
    if series.is_empty() {
        debug!(symbol, "Chart response held no usable rows");
    }

    Ok(MarketHistory { meta, series })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
