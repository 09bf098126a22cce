//! Per-bar snapshot of the indicator columns.

use crate::components::indicator::IndicatorValues;
use crate::schema::columns;
use serde::Serialize;

/// All indicator values for a single bar. `None` means undefined at that
/// bar (warmup, missing input, or column absent).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IndicatorSet {
    #[serde(rename = "SMA_20")]
    pub sma_20: Option<f64>,
    #[serde(rename = "EMA_20")]
    pub ema_20: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<f64>,
    #[serde(rename = "MACD_Signal")]
    pub macd_signal: Option<f64>,
    #[serde(rename = "MACD_Hist")]
    pub macd_hist: Option<f64>,
    #[serde(rename = "ATR")]
    pub atr: Option<f64>,
    #[serde(rename = "Bollinger_Upper")]
    pub bollinger_upper: Option<f64>,
    #[serde(rename = "Bollinger_Middle")]
    pub bollinger_middle: Option<f64>,
    #[serde(rename = "Bollinger_Lower")]
    pub bollinger_lower: Option<f64>,
    #[serde(rename = "Weekly_VWAP")]
    pub weekly_vwap: Option<f64>,
    #[serde(rename = "Resistance")]
    pub resistance: Option<f64>,
    #[serde(rename = "Support")]
    pub support: Option<f64>,
    #[serde(rename = "Returns")]
    pub returns: Option<f64>,
    #[serde(rename = "Log_Returns")]
    pub log_returns: Option<f64>,
}

impl IndicatorSet {
    pub fn at(values: &IndicatorValues, bar_index: usize) -> Self {
        let v = |name: &str| values.defined(name, bar_index);
        Self {
            sma_20: v(columns::SMA_20),
            ema_20: v(columns::EMA_20),
            rsi: v(columns::RSI),
            macd: v(columns::MACD),
            macd_signal: v(columns::MACD_SIGNAL),
            macd_hist: v(columns::MACD_HIST),
            atr: v(columns::ATR),
            bollinger_upper: v(columns::BOLLINGER_UPPER),
            bollinger_middle: v(columns::BOLLINGER_MIDDLE),
            bollinger_lower: v(columns::BOLLINGER_LOWER),
            weekly_vwap: v(columns::WEEKLY_VWAP),
            resistance: v(columns::RESISTANCE),
            support: v(columns::SUPPORT),
            returns: v(columns::RETURNS),
            log_returns: v(columns::LOG_RETURNS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_and_missing_become_none() {
        let mut values = IndicatorValues::new();
        values.insert(columns::RSI, vec![f64::NAN, 42.0]);
        let first = IndicatorSet::at(&values, 0);
        let second = IndicatorSet::at(&values, 1);
        assert_eq!(first.rsi, None);
        assert_eq!(second.rsi, Some(42.0));
        assert_eq!(second.atr, None);
    }

    #[test]
    fn serializes_with_column_names() {
        let mut values = IndicatorValues::new();
        values.insert(columns::MACD_SIGNAL, vec![0.5]);
        let json = serde_json::to_value(IndicatorSet::at(&values, 0)).unwrap();
        assert_eq!(json["MACD_Signal"], 0.5);
        assert!(json["SMA_20"].is_null());
    }
}
