//! Concrete indicator implementations.
//!
//! Every indicator implements the `Indicator` trait from `components::indicator`.
//! They are computed once per table build by the indicator engine and stored
//! as named columns in `IndicatorValues`.
//!
//! Multi-series indicators (Bollinger, MACD, the support/resistance envelope)
//! are exposed as separate named instances per output, keeping the
//! single-series `Indicator` trait unchanged.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod envelope;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use envelope::{Envelope, EnvelopeBand};
pub use macd::{Macd, MacdOutput};
pub use returns::{Returns, ReturnsKind};
pub use rsi::Rsi;
pub use sma::Sma;

/// Apply `f` to every full trailing window of `period` values.
///
/// Output is NaN for the first `period - 1` positions and for every window
/// containing a NaN.
pub(crate) fn rolling_window<F>(values: &[f64], period: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = f(window);
    }

    result
}

/// Exponential smoothing seeded with the mean of the first `period`
/// consecutive defined values.
///
/// `out[t] = alpha * x[t] + (1 - alpha) * out[t-1]`. A NaN input breaks the
/// run; smoothing restarts with a fresh seed once `period` defined values
/// follow it.
pub(crate) fn seeded_smooth(values: &[f64], period: usize, alpha: f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    let mut run = 0usize;
    let mut run_sum = 0.0;
    let mut prev: Option<f64> = None;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
            run_sum = 0.0;
            prev = None;
            continue;
        }
        match prev {
            Some(p) => {
                let next = alpha * v + (1.0 - alpha) * p;
                result[i] = next;
                prev = Some(next);
            }
            None => {
                run += 1;
                run_sum += v;
                if run == period {
                    let seed = run_sum / period as f64;
                    result[i] = seed;
                    prev = Some(seed);
                }
            }
        }
    }

    result
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for first bar),
/// high = max(open,close) + 0.001, low = min(open,close) - 0.001, one bar per hour.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::PriceBar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 0.001, open.min(close) - 0.001, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create bars from explicit (open, high, low, close) tuples, one per hour.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            PriceBar::new(
                base + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
