//! Breakout detector: close crossing the previous bar's support/resistance
//! envelope.
//!
//! Compares close[t] with Resistance[t-1] and Support[t-1], never with the
//! envelope at t, which already includes bar t's own high and low.

use crate::components::indicator::{Indicator, IndicatorValues};
use crate::domain::{BreakoutFlag, PriceBar};
use crate::indicators::Envelope;
use crate::schema::columns;
use std::borrow::Cow;

/// Flag every bar: Bullish if close > previous Resistance, Bearish if
/// close < previous Support, None otherwise.
///
/// When both hold (possible after a malformed bar), Bearish wins. Bar 0 is
/// always None. Resistance / Support are read from `values` when present and
/// computed with `window` otherwise.
pub fn detect_breakouts(
    bars: &[PriceBar],
    values: &IndicatorValues,
    window: usize,
) -> Vec<BreakoutFlag> {
    let resistance = envelope_series(bars, values, columns::RESISTANCE, || {
        Envelope::resistance(window.max(1))
    });
    let support = envelope_series(bars, values, columns::SUPPORT, || {
        Envelope::support(window.max(1))
    });

    let mut flags = vec![BreakoutFlag::None; bars.len()];
    for t in 1..bars.len() {
        flags[t] = classify(bars[t].close, resistance[t - 1], support[t - 1]);
    }
    flags
}

/// Classify one close against the previous bar's envelope.
///
/// NaN on either side never triggers.
pub fn classify(close: f64, prev_resistance: f64, prev_support: f64) -> BreakoutFlag {
    let mut flag = BreakoutFlag::None;
    if close > prev_resistance {
        flag = BreakoutFlag::Bullish;
    }
    if close < prev_support {
        flag = BreakoutFlag::Bearish;
    }
    flag
}

fn envelope_series<'a>(
    bars: &[PriceBar],
    values: &'a IndicatorValues,
    column: &str,
    fallback: impl FnOnce() -> Envelope,
) -> Cow<'a, [f64]> {
    match values.get_series(column) {
        Some(series) if series.len() == bars.len() => Cow::Borrowed(series),
        _ => {
            tracing::debug!(column, "envelope column absent, computing it");
            Cow::Owned(fallback().compute(bars))
        }
    }
}
