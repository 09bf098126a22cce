//! Property tests for table-build invariants.
//!
//! Uses proptest to verify, over random-walk price series:
//! 1. Confidence bounds: confidence in [0, 1], zero exactly when neutral
//! 2. Threshold: every emitted signal meets the active threshold
//! 3. Breakouts: flags follow the previous bar's envelope
//! 4. Bracket ordering: TP/SL straddle the close whenever ATR > 0
//! 5. Indicator ranges: RSI in [0, 100], ATR >= 0, ordered Bollinger bands
//! 6. Short series: fewer bars than the scoring window are never scored
//! 7. Determinism: identical input and config hash identically

use chrono::{Duration, NaiveDate, NaiveDateTime};
use fxsignal_core::breakout::classify;
use fxsignal_core::domain::{PriceBar, SignalDirection, SignalRecord};
use fxsignal_core::schema::columns;
use fxsignal_core::{build_enriched_table, EngineConfig};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn walk_to_bars(steps: &[(f64, f64)]) -> Vec<PriceBar> {
    let mut prev = 1.10_f64;
    steps
        .iter()
        .enumerate()
        .map(|(i, &(step, spread))| {
            let close = (prev + step).max(0.5);
            let bar = PriceBar::new(
                start() + Duration::hours(i as i64),
                prev,
                prev.max(close) + spread,
                prev.min(close) - spread,
                close,
            );
            prev = close;
            bar
        })
        .collect()
}

fn arb_series(max_len: usize) -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec((-0.01..0.01_f64, 0.0..0.003_f64), 0..max_len)
        .prop_map(|steps| walk_to_bars(&steps))
}

fn arb_threshold() -> impl Strategy<Value = f64> {
    0.2..=1.0_f64
}

// ── 1. Confidence Bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn confidence_is_bounded(bars in arb_series(200)) {
        let table = build_enriched_table(bars, &EngineConfig::default()).unwrap();
        for record in table.signals() {
            prop_assert!((0.0..=1.0).contains(&record.confidence));
            prop_assert_eq!(record.confidence > 0.0, !record.signal.is_neutral());
        }
    }
}

// ── 2. Threshold ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn emitted_signals_meet_threshold(
        bars in arb_series(200),
        threshold in arb_threshold(),
    ) {
        let mut config = EngineConfig::default();
        config.scoring.confidence_threshold = threshold;
        let table = build_enriched_table(bars, &config).unwrap();
        for record in table.signals() {
            if !record.signal.is_neutral() {
                prop_assert!(record.confidence >= threshold.min(1.0) - 1e-12);
                let atr_span = (record.take_profit - record.entry_price).abs();
                let stop_span = (record.entry_price - record.stop_loss).abs();
                prop_assert!(atr_span > 0.0);
                prop_assert!((atr_span - 2.0 * stop_span).abs() < 1e-9);
                match record.signal {
                    SignalDirection::Buy => {
                        prop_assert!(record.take_profit > record.entry_price);
                        prop_assert!(record.stop_loss < record.entry_price);
                    }
                    SignalDirection::Sell => {
                        prop_assert!(record.take_profit < record.entry_price);
                        prop_assert!(record.stop_loss > record.entry_price);
                    }
                    SignalDirection::Neutral => unreachable!(),
                }
            }
        }
    }
}

// ── 3. Breakouts ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn breakouts_use_previous_envelope(bars in arb_series(120)) {
        let table = build_enriched_table(bars, &EngineConfig::default()).unwrap();
        let res = table.indicators().get_series(columns::RESISTANCE).unwrap();
        let sup = table.indicators().get_series(columns::SUPPORT).unwrap();
        let flags = table.breakouts();
        if let Some(first) = flags.first() {
            prop_assert_eq!(first.as_i8(), 0);
        }
        for t in 1..flags.len() {
            let expected = classify(table.bars()[t].close, res[t - 1], sup[t - 1]);
            prop_assert_eq!(flags[t], expected);
        }
    }
}

// ── 4. Bracket Ordering ──────────────────────────────────────────────

proptest! {
    #[test]
    fn brackets_straddle_close(bars in arb_series(120)) {
        let table = build_enriched_table(bars, &EngineConfig::default()).unwrap();
        for (i, levels) in table.brackets().iter().enumerate() {
            let close = table.bars()[i].close;
            match table.indicators().get(columns::ATR, i) {
                Some(atr) if atr > 0.0 => {
                    prop_assert!(levels.tp_long > close && close > levels.sl_long);
                    prop_assert!(levels.tp_short < close && close < levels.sl_short);
                }
                Some(atr) if atr.is_nan() => prop_assert!(levels.tp_long.is_nan()),
                _ => {}
            }
        }
    }
}

// ── 5. Indicator Ranges ──────────────────────────────────────────────

proptest! {
    #[test]
    fn indicator_ranges_hold(bars in arb_series(150)) {
        let table = build_enriched_table(bars, &EngineConfig::default()).unwrap();
        let ind = table.indicators();
        for i in 0..table.len() {
            if let Some(rsi) = ind.defined(columns::RSI, i) {
                prop_assert!((0.0..=100.0).contains(&rsi));
            }
            if let Some(atr) = ind.defined(columns::ATR, i) {
                prop_assert!(atr >= 0.0);
            }
            if let (Some(u), Some(m), Some(l)) = (
                ind.defined(columns::BOLLINGER_UPPER, i),
                ind.defined(columns::BOLLINGER_MIDDLE, i),
                ind.defined(columns::BOLLINGER_LOWER, i),
            ) {
                prop_assert!(u >= m - 1e-12 && m >= l - 1e-12);
            }
            if let (Some(r), Some(s)) = (
                ind.defined(columns::RESISTANCE, i),
                ind.defined(columns::SUPPORT, i),
            ) {
                prop_assert!(r >= s);
            }
        }
    }
}

// ── 6. Short Series ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn short_series_are_never_scored(bars in arb_series(20)) {
        let table = build_enriched_table(bars.clone(), &EngineConfig::default()).unwrap();
        for (record, bar) in table.signals().iter().zip(&bars) {
            prop_assert_eq!(*record, SignalRecord::unscored(bar.close));
        }
    }
}

// ── 7. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn builds_are_deterministic(bars in arb_series(150)) {
        let config = EngineConfig::default();
        let a = build_enriched_table(bars.clone(), &config).unwrap();
        let b = build_enriched_table(bars, &config).unwrap();
        prop_assert_eq!(a.fingerprint(), b.fingerprint());
        prop_assert_eq!(a.indicators().fingerprint(), b.indicators().fingerprint());
    }
}
