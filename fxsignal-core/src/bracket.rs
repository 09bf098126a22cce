//! Bracket-level calculator: volatility-scaled take-profit and stop-loss
//! levels for both a long and a short posture on every bar.

use crate::components::indicator::IndicatorValues;
use crate::config::BracketConfig;
use crate::domain::{BracketLevels, PriceBar};
use crate::schema::columns;

/// Levels for one bar. Undefined close or ATR gives undefined levels.
pub fn bracket_levels(close: f64, atr: f64, config: &BracketConfig) -> BracketLevels {
    if close.is_nan() || atr.is_nan() {
        return BracketLevels::undefined();
    }
    let tp = atr * config.atr_multiplier_tp;
    let sl = atr * config.atr_multiplier_sl;
    BracketLevels {
        tp_long: close + tp,
        sl_long: close - sl,
        tp_short: close - tp,
        sl_short: close + sl,
    }
}

/// Levels for every bar, reading the ATR column.
pub fn compute_brackets(
    bars: &[PriceBar],
    values: &IndicatorValues,
    config: &BracketConfig,
) -> Vec<BracketLevels> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let atr = values.get(columns::ATR, i).unwrap_or(f64::NAN);
            bracket_levels(bar.close, atr, config)
        })
        .collect()
}
