// =============================================================================
// Dashboard Payload
// =============================================================================
//
// The display-layer contract: everything one page render needs in a single
// response. Chart data is columnar (one entry per trading day, indicator
// columns aligned with nulls where undefined) so the front end can hand the
// arrays straight to a plotting library.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::briefing::Briefing;
use crate::engine::{Analysis, Grade, IndicatorSeries, PriceSeries};
use crate::providers::{NewsItem, SymbolMeta};

/// Summary metric cards across the top of the page.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub last_close: f64,
    /// Last close minus the close before it. Absent with under two days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_change: Option<f64>,
    pub score: u8,
    pub grade: Grade,
    pub grade_summary: String,
}

/// Columnar chart series. All vectors share one length.
#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub moving_avg: Vec<Option<f64>>,
    pub upper_band: Vec<Option<f64>>,
    pub lower_band: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl ChartData {
    fn build(series: &PriceSeries, indicators: &IndicatorSeries) -> Self {
        let points = series.points();
        Self {
            dates: points.iter().map(|p| p.date).collect(),
            open: points.iter().map(|p| p.open).collect(),
            high: points.iter().map(|p| p.high).collect(),
            low: points.iter().map(|p| p.low).collect(),
            close: points.iter().map(|p| p.close).collect(),
            volume: points.iter().map(|p| p.volume).collect(),
            moving_avg: indicators.moving_avg.clone(),
            upper_band: indicators.upper_band.clone(),
            lower_band: indicators.lower_band.clone(),
            rsi: indicators.rsi.clone(),
        }
    }
}

/// One full page render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPayload {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub currency: String,
    pub currency_sign: &'static str,
    pub metrics: Metrics,
    pub chart: ChartData,
    pub news: Vec<NewsItem>,
    pub briefing: Briefing,
    pub generated_at: i64,
}

pub fn build_dashboard(
    meta: &SymbolMeta,
    series: &PriceSeries,
    analysis: &Analysis,
    news: Vec<NewsItem>,
    briefing: Briefing,
) -> DashboardPayload {
    DashboardPayload {
        symbol: meta.symbol.clone(),
        display_name: meta.display_name.clone(),
        currency: meta.currency.clone(),
        currency_sign: meta.currency_sign(),
        metrics: Metrics {
            last_close: series.last().map(|p| p.close).unwrap_or(0.0),
            day_change: series.day_change(),
            score: analysis.score.score,
            grade: analysis.score.grade,
            grade_summary: analysis.score.grade.summary().to_string(),
        },
        chart: ChartData::build(series, &analysis.indicators),
        news,
        briefing,
        generated_at: Utc::now().timestamp_millis(),
    }
}
