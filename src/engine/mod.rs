// =============================================================================
// Indicator & Scoring Engine
// =============================================================================
//
// Pure, synchronous computation over a daily price series. No I/O, no clock,
// no shared state: the same series and parameters always produce the same
// output. Indicator values are `Option` so callers can tell "window not
// filled yet" apart from a real value; the only hard failure in the whole
// engine is an empty series.

pub mod indicators;
pub mod score;
pub mod series;

pub use indicators::{compute_indicators, IndicatorParams, IndicatorSeries};
pub use score::{compute_score, Grade, ScoreResult};
pub use series::{EngineError, PricePoint, PriceSeries};

/// Outcome of a full engine pass over one price series.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub indicators: IndicatorSeries,
    pub score: ScoreResult,
}

/// Run the full pipeline: indicator columns, then the last-day score.
pub fn analyze(series: &PriceSeries, params: &IndicatorParams) -> Result<Analysis, EngineError> {
    let indicators = compute_indicators(series, params);
    let score = compute_score(series, &indicators)?;
    Ok(Analysis { indicators, score })
}
