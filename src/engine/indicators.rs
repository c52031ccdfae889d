// =============================================================================
// Rolling-Window Indicators
// =============================================================================
//
// All indicators share one convention: the output is aligned index-for-index
// with the input closes, and an index whose look-back window is not yet
// filled carries `None`. Nothing here interpolates, back-fills, or peeks
// ahead; the value at index i depends only on closes[..=i].
//
//   moving_avg[i] = mean(close[i-w+1 ..= i])              defined for i >= w-1
//   std_dev[i]    = population sigma over the same window  defined for i >= w-1
//   upper_band[i] = moving_avg[i] + band_width * std_dev[i]
//   lower_band[i] = moving_avg[i] - band_width * std_dev[i]
//
// RSI uses simple rolling means of one-day gains and losses over the last
// `rsi_window` deltas (not Wilder's recursive smoothing):
//
//   RS  = avg_gain / avg_loss
//   RSI = 100 - 100 / (1 + RS)        clamped to 100 when avg_loss == 0
//
// The first delta needs two closes, so rsi[i] is defined for i >= rsi_window.

use serde::{Deserialize, Serialize};

use super::series::PriceSeries;

fn default_ma_window() -> usize {
    20
}

fn default_band_width() -> f64 {
    2.0
}

fn default_rsi_window() -> usize {
    14
}

/// Look-back windows for the indicator pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Window for the moving average and the band baseline, in trading days.
    #[serde(default = "default_ma_window")]
    pub ma_window: usize,

    /// Band half-width as a multiple of the rolling standard deviation.
    #[serde(default = "default_band_width")]
    pub band_width: f64,

    /// Window for the RSI gain/loss averages, in one-day deltas.
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_window: default_ma_window(),
            band_width: default_band_width(),
            rsi_window: default_rsi_window(),
        }
    }
}

/// Indicator columns aligned with the source series.
///
/// Every vector has exactly the length of the series it was computed from.
/// `None` marks indices where the look-back window is not satisfied yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub moving_avg: Vec<Option<f64>>,
    pub std_dev: Vec<Option<f64>>,
    pub upper_band: Vec<Option<f64>>,
    pub lower_band: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Moving average on the most recent day, if defined.
    pub fn last_moving_avg(&self) -> Option<f64> {
        self.moving_avg.last().copied().flatten()
    }

    /// RSI on the most recent day, if defined.
    pub fn last_rsi(&self) -> Option<f64> {
        self.rsi.last().copied().flatten()
    }
}

/// Simple moving average over a trailing window.
///
/// # Edge cases
/// - `window == 0` or `window > values.len()`: every entry is `None`.
/// - The first `window - 1` entries are always `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}

/// Rolling standard deviation over a trailing window.
///
/// Uses the population definition (divide by `n`, not `n - 1`), so a window
/// of identical values yields exactly `0.0`.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                let mean = slice.iter().sum::<f64>() / window as f64;
                let variance = slice
                    .iter()
                    .map(|v| {
                        let d = v - mean;
                        d * d
                    })
                    .sum::<f64>()
                    / window as f64;
                Some(variance.sqrt())
            }
        })
        .collect()
}

/// RSI from simple rolling means of gains and losses.
///
/// The delta at index i is `closes[i] - closes[i - 1]`; positive deltas feed
/// the gain average, negative deltas feed the loss average, and a zero delta
/// feeds neither.
///
/// # Edge cases
/// - Defined from index `window` onward (the window needs `window` deltas,
///   which need `window + 1` closes).
/// - `avg_loss == 0` maps to `RSI = 100`, including a completely flat window.
///   A window without a single down day is maximal momentum by this
///   indicator's definition, so RSI never divides by zero and never dips when
///   prices only rise or hold.
pub fn rsi_series(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut out = vec![None; n];
    if window == 0 || n < window + 1 {
        return out;
    }

    // Per-index gain/loss magnitudes; index 0 has no delta and stays zero.
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    for (i, slot) in out.iter_mut().enumerate().skip(window) {
        let lo = i + 1 - window;
        let avg_gain = gains[lo..=i].iter().sum::<f64>() / window as f64;
        let avg_loss = losses[lo..=i].iter().sum::<f64>() / window as f64;

        *slot = Some(if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        });
    }

    out
}

/// Run the full indicator pipeline over one series.
///
/// Output vectors are aligned with the series; an empty series yields empty
/// vectors. This function never fails, thin history just produces `None`s.
pub fn compute_indicators(series: &PriceSeries, params: &IndicatorParams) -> IndicatorSeries {
    let closes = series.closes();

    let moving_avg = rolling_mean(&closes, params.ma_window);
    let std_dev = rolling_std(&closes, params.ma_window);

    let upper_band = moving_avg
        .iter()
        .zip(std_dev.iter())
        .map(|(ma, sd)| match (ma, sd) {
            (Some(ma), Some(sd)) => Some(ma + params.band_width * sd),
            _ => None,
        })
        .collect();
    let lower_band = moving_avg
        .iter()
        .zip(std_dev.iter())
        .map(|(ma, sd)| match (ma, sd) {
            (Some(ma), Some(sd)) => Some(ma - params.band_width * sd),
            _ => None,
        })
        .collect();

    let rsi = rsi_series(&closes, params.rsi_window);

    IndicatorSeries {
        moving_avg,
        std_dev,
        upper_band,
        lower_band,
        rsi,
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::series::{PricePoint, PriceSeries};
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

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    // ---- rolling_mean ------------------------------------------------------

    #[test]
    fn rolling_mean_known_values() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn rolling_mean_degenerate_windows() {
        assert_eq!(rolling_mean(&[1.0, 2.0], 0), vec![None, None]);
        assert_eq!(rolling_mean(&[1.0, 2.0], 3), vec![None, None]);
        assert_eq!(rolling_mean(&[], 5), Vec::<Option<f64>>::new());
    }

    // ---- rolling_std -------------------------------------------------------

    #[test]
    fn rolling_std_uses_population_definition() {
        // Population sigma of this window is exactly 2.0; the sample
        // definition (divide by n - 1) would give ~2.1381.
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_std(&data, 8);
        let last = out[7].unwrap();
        assert_approx(last, 2.0, 1e-12);
        assert!((last - 2.1381).abs() > 0.1);
    }

    #[test]
    fn rolling_std_is_zero_on_flat_window() {
        let out = rolling_std(&[5.0; 6], 4);
        assert_eq!(out[3], Some(0.0));
        assert_eq!(out[5], Some(0.0));
    }

    // ---- rsi_series --------------------------------------------------------

    #[test]
    fn rsi_undefined_until_window_plus_one_closes() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert!(rsi_series(&closes, 14).iter().all(Option::is_none));

        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = rsi_series(&closes, 14);
        assert!(out[..14].iter().all(Option::is_none));
        assert!(out[14].is_some());
    }

    #[test]
    fn rsi_is_100_on_non_decreasing_closes() {
        // Rises and flat days only, so the loss average is zero everywhere.
        let closes = [
            100.0, 100.0, 101.0, 101.0, 103.0, 103.0, 103.0, 104.0, 104.0, 106.0, 106.0, 107.0,
            107.0, 108.0, 110.0, 110.0,
        ];
        let out = rsi_series(&closes, 14);
        assert_eq!(out[14], Some(100.0));
        assert_eq!(out[15], Some(100.0));
    }

    #[test]
    fn rsi_is_100_on_flat_closes() {
        let out = rsi_series(&[50.0; 16], 14);
        assert_eq!(out[14], Some(100.0));
        assert_eq!(out[15], Some(100.0));
    }

    #[test]
    fn rsi_is_0_on_strictly_falling_closes() {
        let closes: Vec<f64> = (0..16).map(|i| 200.0 - i as f64).collect();
        let out = rsi_series(&closes, 14);
        assert_eq!(out[14], Some(0.0));
    }

    #[test]
    fn rsi_known_value_small_window() {
        // Deltas: +1.0, -0.5, +1.0. With window 2 both defined indices have
        // avg_gain 0.5 and avg_loss 0.25, so RS = 2 and RSI = 66.67.
        let out = rsi_series(&[10.0, 11.0, 10.5, 11.5], 2);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_approx(out[2].unwrap(), 100.0 - 100.0 / 3.0, 1e-9);
        assert_approx(out[3].unwrap(), 100.0 - 100.0 / 3.0, 1e-9);
    }

    // ---- compute_indicators ------------------------------------------------

    #[test]
    fn flat_series_pins_every_indicator() {
        let series = series_from_closes(&[100.0; 30]);
        let out = compute_indicators(&series, &IndicatorParams::default());

        for i in 19..30 {
            assert_eq!(out.moving_avg[i], Some(100.0));
            assert_eq!(out.std_dev[i], Some(0.0));
            assert_eq!(out.upper_band[i], Some(100.0));
            assert_eq!(out.lower_band[i], Some(100.0));
        }
        for i in 14..30 {
            assert_eq!(out.rsi[i], Some(100.0));
        }
    }

    #[test]
    fn bands_are_symmetric_around_the_mean() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let series = series_from_closes(&closes);
        let params = IndicatorParams {
            band_width: 2.5,
            ..IndicatorParams::default()
        };
        let out = compute_indicators(&series, &params);

        for i in 19..40 {
            let ma = out.moving_avg[i].unwrap();
            let sd = out.std_dev[i].unwrap();
            assert_approx(out.upper_band[i].unwrap(), ma + 2.5 * sd, 1e-9);
            assert_approx(out.lower_band[i].unwrap(), ma - 2.5 * sd, 1e-9);
        }
    }

    #[test]
    fn outputs_stay_aligned_with_the_series() {
        let series = series_from_closes(&[10.0, 11.0, 12.0]);
        let out = compute_indicators(&series, &IndicatorParams::default());
        assert_eq!(out.moving_avg.len(), 3);
        assert_eq!(out.std_dev.len(), 3);
        assert_eq!(out.upper_band.len(), 3);
        assert_eq!(out.lower_band.len(), 3);
        assert_eq!(out.rsi.len(), 3);

        let empty = compute_indicators(&PriceSeries::empty(), &IndicatorParams::default());
        assert!(empty.moving_avg.is_empty());
        assert!(empty.rsi.is_empty());
    }

    #[test]
    fn indicators_are_causal() {
        // Values at index i must not change when later points are appended.
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 8.0 + i as f64 * 0.05)
            .collect();
        let full = compute_indicators(&series_from_closes(&closes), &IndicatorParams::default());
        let prefix =
            compute_indicators(&series_from_closes(&closes[..45]), &IndicatorParams::default());

        assert_eq!(&full.moving_avg[..45], &prefix.moving_avg[..]);
        assert_eq!(&full.std_dev[..45], &prefix.std_dev[..]);
        assert_eq!(&full.upper_band[..45], &prefix.upper_band[..]);
        assert_eq!(&full.lower_band[..45], &prefix.lower_band[..]);
        assert_eq!(&full.rsi[..45], &prefix.rsi[..]);
    }

    #[test]
    fn windowed_matches_incremental_accumulator() {
        // An O(n) running-sum implementation must agree with the windowed
        // recomputation to within float tolerance.
        let window = 20;
        let values: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 8.0 + i as f64 * 0.05)
            .collect();

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut inc_mean = vec![None; values.len()];
        let mut inc_std = vec![None; values.len()];
        for i in 0..values.len() {
            sum += values[i];
            sum_sq += values[i] * values[i];
            if i >= window {
                sum -= values[i - window];
                sum_sq -= values[i - window] * values[i - window];
            }
            if i + 1 >= window {
                let mean = sum / window as f64;
                let variance = (sum_sq / window as f64 - mean * mean).max(0.0);
                inc_mean[i] = Some(mean);
                inc_std[i] = Some(variance.sqrt());
            }
        }

        let win_mean = rolling_mean(&values, window);
        let win_std = rolling_std(&values, window);
        for i in 0..values.len() {
            match (win_mean[i], inc_mean[i]) {
                (Some(a), Some(b)) => assert_approx(a, b, 1e-9),
                (a, b) => assert_eq!(a, b),
            }
            match (win_std[i], inc_std[i]) {
                (Some(a), Some(b)) => assert_approx(a, b, 1e-7),
                (a, b) => assert_eq!(a, b),
            }
        }
    }
}
