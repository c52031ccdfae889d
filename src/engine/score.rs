// =============================================================================
// Heuristic Score & Grade
// =============================================================================
//
// Reduces the most recent trading day to a 0-100 score and a letter grade.
// Start from a neutral 50, add a trend adjustment against the moving
// average, add a momentum adjustment from RSI, clamp. Each adjustment is
// applied only when its indicator is defined on the last day; thin history
// narrows the score toward neutral instead of failing.

use serde::{Serialize, Serializer};
use std::fmt;

use super::indicators::IndicatorSeries;
use super::series::{EngineError, PriceSeries};

const BASE_SCORE: i32 = 50;
const TREND_BONUS: i32 = 20;
const TREND_PENALTY: i32 = 10;
const OVERSOLD_BONUS: i32 = 30;
const OVERBOUGHT_PENALTY: i32 = 10;

const OVERSOLD_RSI: f64 = 30.0;
const OVERBOUGHT_RSI: f64 = 70.0;

/// Letter grade derived from the score. Thresholds, first match wins:
/// 80+ is SSS, 60+ is S, 40+ is A, everything below is B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    StrongBuy,
    Buy,
    Hold,
    Caution,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Grade::StrongBuy
        } else if score >= 60 {
            Grade::Buy
        } else if score >= 40 {
            Grade::Hold
        } else {
            Grade::Caution
        }
    }

    /// Short label shown on the dashboard metric card.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::StrongBuy => "SSS",
            Grade::Buy => "S",
            Grade::Hold => "A",
            Grade::Caution => "B",
        }
    }

    /// One-phrase reading of the grade, used in the briefing.
    pub fn summary(&self) -> &'static str {
        match self {
            Grade::StrongBuy => "strong buy",
            Grade::Buy => "buy",
            Grade::Hold => "hold and watch",
            Grade::Caution => "caution",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Grades travel over the wire as their letter label, not a variant name.
impl Serialize for Grade {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// Final verdict for the most recent trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: u8,
    pub grade: Grade,
}

/// Score the last day of `series` against its `indicators`.
///
/// `indicators` must have been computed from the same series.
///
/// # Edge cases
/// - Empty series: [`EngineError::InsufficientData`].
/// - Moving average undefined on the last day: the trend adjustment is
///   skipped entirely (no bonus, no penalty).
/// - RSI undefined on the last day: the momentum adjustment is skipped.
pub fn compute_score(
    series: &PriceSeries,
    indicators: &IndicatorSeries,
) -> Result<ScoreResult, EngineError> {
    let last = series.last().ok_or(EngineError::InsufficientData)?;
    let mut score = BASE_SCORE;

    // Trend: last close against the moving average.
    if let Some(avg) = indicators.last_moving_avg() {
        if last.close > avg {
            score += TREND_BONUS;
        } else {
            score -= TREND_PENALTY;
        }
    }

    // Momentum: oversold is a buying opportunity, overbought a mild warning.
    if let Some(rsi) = indicators.last_rsi() {
        if rsi < OVERSOLD_RSI {
            score += OVERSOLD_BONUS;
        } else if rsi > OVERBOUGHT_RSI {
            score -= OVERBOUGHT_PENALTY;
        }
    }

    let score = score.clamp(0, 100) as u8;
    Ok(ScoreResult {
        score,
        grade: Grade::from_score(score),
    })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::indicators::{compute_indicators, IndicatorParams};
    use crate::engine::series::PricePoint;
    use chrono::NaiveDate;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect();
        PriceSeries::from_points(points).unwrap()
    }

    fn score_of(closes: &[f64]) -> ScoreResult {
        let series = series_from_closes(closes);
        let indicators = compute_indicators(&series, &IndicatorParams::default());
        compute_score(&series, &indicators).unwrap()
    }

    /// 24 closes zigzagging 100/101, then one final close. Keeps RSI inside
    /// the neutral band so only the trend adjustment moves the score.
    fn zigzag_then(final_close: f64) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..24)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        closes.push(final_close);
        closes
    }

    // ---- grade table -------------------------------------------------------

    #[test]
    fn grade_thresholds() {
        assert_eq!(Grade::from_score(100), Grade::StrongBuy);
        assert_eq!(Grade::from_score(80), Grade::StrongBuy);
        assert_eq!(Grade::from_score(79), Grade::Buy);
        assert_eq!(Grade::from_score(60), Grade::Buy);
        assert_eq!(Grade::from_score(59), Grade::Hold);
        assert_eq!(Grade::from_score(40), Grade::Hold);
        assert_eq!(Grade::from_score(39), Grade::Caution);
        assert_eq!(Grade::from_score(0), Grade::Caution);
    }

    #[test]
    fn grade_labels_and_summaries() {
        assert_eq!(Grade::StrongBuy.label(), "SSS");
        assert_eq!(Grade::Buy.label(), "S");
        assert_eq!(Grade::Hold.label(), "A");
        assert_eq!(Grade::Caution.label(), "B");
        assert_eq!(Grade::Buy.summary(), "buy");
        assert_eq!(format!("{}", Grade::Hold), "A");
    }

    #[test]
    fn grade_serializes_as_its_label() {
        let json = serde_json::to_value(ScoreResult {
            score: 85,
            grade: Grade::StrongBuy,
        })
        .unwrap();
        assert_eq!(json["grade"], "SSS");
        assert_eq!(json["score"], 85);
    }

    // ---- compute_score -----------------------------------------------------

    #[test]
    fn empty_series_fails() {
        let series = PriceSeries::empty();
        let indicators = compute_indicators(&series, &IndicatorParams::default());
        let err = compute_score(&series, &indicators).unwrap_err();
        assert_eq!(err, EngineError::InsufficientData);
    }

    #[test]
    fn single_point_scores_neutral() {
        // Neither indicator is defined, so nothing moves the baseline.
        let result = score_of(&[123.45]);
        assert_eq!(result.score, 50);
        assert_eq!(result.grade, Grade::Hold);
    }

    #[test]
    fn trend_bonus_with_neutral_momentum() {
        // Final close 103: RSI lands at 60 (inside the neutral band) and the
        // close sits above the 20-day average, so only +20 applies.
        let result = score_of(&zigzag_then(103.0));
        assert_eq!(result.score, 70);
        assert_eq!(result.grade, Grade::Buy);
    }

    #[test]
    fn trend_penalty_with_neutral_momentum() {
        // Final close 97: RSI ~41.2, close below the average, so only -10.
        let result = score_of(&zigzag_then(97.0));
        assert_eq!(result.score, 40);
        assert_eq!(result.grade, Grade::Hold);
    }

    #[test]
    fn trend_adjustment_skipped_without_enough_history() {
        // 19 rising closes: the 20-day average is undefined, RSI is 100.
        // Only the overbought penalty applies. An unguarded trend branch
        // would have produced 60 (bonus) or 30 (penalty) instead.
        let closes: Vec<f64> = (0..19).map(|i| 100.0 + i as f64).collect();
        let result = score_of(&closes);
        assert_eq!(result.score, 40);
        assert_eq!(result.grade, Grade::Hold);
    }

    #[test]
    fn oversold_bonus_without_trend() {
        // 15 falling closes: RSI 0 (< 30) adds 30, trend is skipped.
        let closes: Vec<f64> = (0..15).map(|i| 200.0 - 2.0 * i as f64).collect();
        let result = score_of(&closes);
        assert_eq!(result.score, 80);
        assert_eq!(result.grade, Grade::StrongBuy);
    }

    #[test]
    fn flat_history_is_cautious() {
        // Flat 25 days: close equals the average (no bonus, -10) and the
        // zero-loss window pins RSI at 100 (-10 more).
        let result = score_of(&[100.0; 25]);
        assert_eq!(result.score, 30);
        assert_eq!(result.grade, Grade::Caution);
    }

    #[test]
    fn score_is_deterministic() {
        let closes = zigzag_then(103.0);
        assert_eq!(score_of(&closes), score_of(&closes));
    }

    #[test]
    fn score_stays_in_bounds() {
        let cases: Vec<Vec<f64>> = vec![
            vec![100.0; 25],
            (0..25).map(|i| 100.0 + i as f64).collect(),
            (0..25).map(|i| 200.0 - i as f64).collect(),
            (0..15).map(|i| 200.0 - 2.0 * i as f64).collect(),
            vec![42.0],
        ];
        for closes in cases {
            let result = score_of(&closes);
            assert!(result.score <= 100);
        }
    }
}
