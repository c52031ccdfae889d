// =============================================================================
// Price Series
// =============================================================================
//
// The input side of the engine: one OHLCV point per trading day, ordered
// ascending by date. The series is the single source of truth for every
// derived indicator, so the ordering contract is enforced at construction
// time instead of being re-checked by each consumer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single trading day of OHLCV data. Immutable once retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Hard failures of the engine.
///
/// Thin history is *not* an error anywhere in the engine: indicators degrade
/// to undefined values and score adjustments are skipped. The only hard
/// failures are an empty series and a series that violates the ordering
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("price series is empty, nothing to analyze")]
    InsufficientData,

    #[error("price series is not in ascending date order: {prev} is followed by {next}")]
    OutOfOrder { prev: NaiveDate, next: NaiveDate },

    #[error("duplicate trading day in price series: {0}")]
    DuplicateDate(NaiveDate),
}

/// An ascending-by-date series of daily price points.
///
/// Constructed through [`PriceSeries::from_points`], which rejects
/// out-of-order and duplicate dates, so holders can rely on the ordering
/// invariant without re-validating.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate the ordering contract and wrap the points.
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, EngineError> {
        for pair in points.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.date < prev.date {
                return Err(EngineError::OutOfOrder {
                    prev: prev.date,
                    next: next.date,
                });
            }
            if next.date == prev.date {
                return Err(EngineError::DuplicateDate(next.date));
            }
        }
        Ok(Self { points })
    }

    /// A series with no points. Valid to hold (a provider may return no rows
    /// for an unknown symbol); scoring it fails with
    /// [`EngineError::InsufficientData`].
    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent trading day, if any.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Closing prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Day-over-day change of the closing price (last close minus the close
    /// before it). `None` when the series has fewer than two points.
    pub fn day_change(&self) -> Option<f64> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        Some(self.points[n - 1].close - self.points[n - 2].close)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        }
    }

    // ---- from_points -------------------------------------------------------

    #[test]
    fn ascending_series_is_accepted() {
        let series = PriceSeries::from_points(vec![point(1, 10.0), point(2, 11.0), point(5, 9.0)]);
        assert!(series.is_ok());
        assert_eq!(series.unwrap().len(), 3);
    }

    #[test]
    fn empty_series_is_constructible() {
        let series = PriceSeries::from_points(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.last(), None);
    }

    #[test]
    fn out_of_order_dates_are_rejected() {
        let err = PriceSeries::from_points(vec![point(5, 10.0), point(2, 11.0)]).unwrap_err();
        assert!(matches!(err, EngineError::OutOfOrder { .. }));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let err = PriceSeries::from_points(vec![point(3, 10.0), point(3, 10.5)]).unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateDate(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap())
        );
    }

    // ---- accessors ---------------------------------------------------------

    #[test]
    fn closes_preserve_order() {
        let series =
            PriceSeries::from_points(vec![point(1, 10.0), point(2, 12.0), point(3, 11.0)]).unwrap();
        assert_eq!(series.closes(), vec![10.0, 12.0, 11.0]);
    }

    #[test]
    fn day_change_is_last_minus_previous() {
        let series =
            PriceSeries::from_points(vec![point(1, 10.0), point(2, 12.5), point(3, 11.0)]).unwrap();
        assert_eq!(series.day_change(), Some(-1.5));
    }

    #[test]
    fn day_change_undefined_for_single_point() {
        let series = PriceSeries::from_points(vec![point(1, 10.0)]).unwrap();
        assert_eq!(series.day_change(), None);
        assert!(PriceSeries::empty().day_change().is_none());
    }
}
