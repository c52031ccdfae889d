// =============================================================================
// Presenter Briefing
// =============================================================================
//
// A four-line narrative for the dashboard's summary panel, written like a
// run-of-show: opening with the verdict, the chart read, a pointer at the
// headlines, and the closing call. Generated from the same analysis the
// metric cards show, so the text can never disagree with the numbers.

use serde::Serialize;

use crate::engine::{IndicatorParams, IndicatorSeries, PriceSeries, ScoreResult};

/// Score at or above which the closing call reads buy-side.
const BUY_SIDE_SCORE: u8 = 60;

/// Generated narrative, one beat per field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Briefing {
    pub opening: String,
    pub trend: String,
    pub news: String,
    pub verdict: String,
}

pub fn build_briefing(
    symbol: &str,
    series: &PriceSeries,
    indicators: &IndicatorSeries,
    score: &ScoreResult,
    params: &IndicatorParams,
) -> Briefing {
    let opening = format!(
        "Today's look at {}: the model scores it {} out of 100, grade {} ({}).",
        symbol,
        score.score,
        score.grade.label(),
        score.grade.summary()
    );

    let trend = match (series.last(), indicators.last_moving_avg()) {
        (Some(last), Some(avg)) => {
            let side = if last.close > avg { "above" } else { "below" };
            format!(
                "On the chart, the last close sits {} its {}-day moving average.",
                side, params.ma_window
            )
        }
        _ => format!(
            "The chart does not have enough history yet for a {}-day moving average read.",
            params.ma_window
        ),
    };

    let news = "Recent headlines are lined up next to the chart for context.".to_string();

    let verdict = if score.score >= BUY_SIDE_SCORE {
        "Closing call: this setup leans buy-side.".to_string()
    } else {
        "Closing call: stay on hold and wait for confirmation.".to_string()
    };

    Briefing {
        opening,
        trend,
        news,
        verdict,
    }
}
