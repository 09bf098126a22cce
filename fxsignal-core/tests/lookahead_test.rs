//! Look-ahead contamination tests.
//!
//! No value at bar t may depend on bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200) and require bars 0..100 to match. Any difference means
//! future data leaked into past values.

use chrono::{Duration, NaiveDate};
use fxsignal_core::components::Indicator;
use fxsignal_core::domain::PriceBar;
use fxsignal_core::indicators::*;
use fxsignal_core::{build_enriched_table, EngineConfig};

/// Deterministic pseudo-random walk around 1.10.
fn make_test_bars(n: usize) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut price: f64 = 1.10;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.00005;
            price = (price + change).max(0.5);

            let open = price - 0.0004;
            let close = price + 0.0002;
            PriceBar::new(
                start + Duration::hours(i as i64),
                open,
                open.max(close) + 0.001,
                open.min(close) - 0.001,
                close,
            )
        })
        .collect()
}

fn assert_same_prefix(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (&t, &f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-12,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[PriceBar], truncated_len: usize) {
    let truncated = indicator.compute(&full_bars[..truncated_len]);
    let full = indicator.compute(full_bars);
    assert_eq!(truncated.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full.len(), full_bars.len(), "{}", indicator.name());
    assert_same_prefix(indicator.name(), &truncated, &full);
}

#[test]
fn lookahead_moving_averages() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Sma::new(20), &bars, 100);
    assert_no_lookahead(&Ema::new(20), &bars, 100);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
}

#[test]
fn lookahead_macd() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Macd::line(12, 26, 9), &bars, 100);
    assert_no_lookahead(&Macd::signal(12, 26, 9), &bars, 100);
    assert_no_lookahead(&Macd::histogram(12, 26, 9), &bars, 100);
}

#[test]
fn lookahead_atr() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Atr::new(14), &bars, 100);
}

#[test]
fn lookahead_bollinger() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Bollinger::upper(20, 2.0), &bars, 100);
    assert_no_lookahead(&Bollinger::middle(20, 2.0), &bars, 100);
    assert_no_lookahead(&Bollinger::lower(20, 2.0), &bars, 100);
}

#[test]
fn lookahead_envelope_and_returns() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Envelope::resistance(20), &bars, 100);
    assert_no_lookahead(&Envelope::support(20), &bars, 100);
    assert_no_lookahead(&Returns::simple(), &bars, 100);
    assert_no_lookahead(&Returns::log(), &bars, 100);
}

#[test]
fn lookahead_table_outputs() {
    let bars = make_test_bars(200);
    let config = EngineConfig::default();
    let full = build_enriched_table(bars.clone(), &config).unwrap();
    let truncated = build_enriched_table(bars[..100].to_vec(), &config).unwrap();

    assert_eq!(truncated.breakouts(), &full.breakouts()[..100]);
    assert_eq!(truncated.signals(), &full.signals()[..100]);
    for (i, (t, f)) in truncated.brackets().iter().zip(full.brackets()).enumerate() {
        assert_same_prefix(
            &format!("brackets[{i}]"),
            &[t.tp_long, t.sl_short],
            &[f.tp_long, f.sl_short],
        );
    }
}
