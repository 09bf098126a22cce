//! Indicator engine: computes every indicator column once per table build.
//!
//! Results are stored in an `IndicatorValues` container keyed by output
//! column name. Downstream stages (breakouts, brackets, scoring) only read
//! from that container.

use crate::components::indicator::{Indicator, IndicatorValues};
use crate::config::IndicatorConfig;
use crate::diagnostics::{scan_price_fields, Diagnostic, Diagnostics};
use crate::domain::{PriceBar, PriceField};
use crate::indicators::{Atr, Bollinger, Ema, Envelope, Macd, Returns, Rsi, Sma};
use crate::schema::columns;
use std::borrow::Cow;

/// Registry of indicators, each bound to the column it fills.
pub struct IndicatorEngine {
    registry: Vec<(&'static str, Box<dyn Indicator>)>,
}

impl IndicatorEngine {
    /// Standard column set built from the configured windows.
    pub fn from_config(config: &IndicatorConfig) -> Self {
        let c = config;
        let registry: Vec<(&'static str, Box<dyn Indicator>)> = vec![
            (columns::SMA_20, Box::new(Sma::new(c.sma_window))),
            (columns::EMA_20, Box::new(Ema::new(c.ema_window))),
            (columns::RSI, Box::new(Rsi::new(c.rsi_window))),
            (
                columns::MACD,
                Box::new(Macd::line(c.macd_fast, c.macd_slow, c.macd_signal)),
            ),
            (
                columns::MACD_SIGNAL,
                Box::new(Macd::signal(c.macd_fast, c.macd_slow, c.macd_signal)),
            ),
            (
                columns::MACD_HIST,
                Box::new(Macd::histogram(c.macd_fast, c.macd_slow, c.macd_signal)),
            ),
            (columns::ATR, Box::new(Atr::new(c.atr_window))),
            (
                columns::BOLLINGER_UPPER,
                Box::new(Bollinger::upper(c.bollinger_window, c.bollinger_std)),
            ),
            (
                columns::BOLLINGER_MIDDLE,
                Box::new(Bollinger::middle(c.bollinger_window, c.bollinger_std)),
            ),
            (
                columns::BOLLINGER_LOWER,
                Box::new(Bollinger::lower(c.bollinger_window, c.bollinger_std)),
            ),
            (columns::WEEKLY_VWAP, Box::new(Sma::new(c.vwap_window))),
            (
                columns::RESISTANCE,
                Box::new(Envelope::resistance(c.envelope_window)),
            ),
            (columns::SUPPORT, Box::new(Envelope::support(c.envelope_window))),
            (columns::RETURNS, Box::new(Returns::simple())),
            (columns::LOG_RETURNS, Box::new(Returns::log())),
        ];
        Self { registry }
    }

    /// Output columns in registry order.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.iter().map(|(column, _)| *column)
    }

    /// Compute the warmup length: the maximum lookback across all indicators.
    pub fn warmup(&self) -> usize {
        self.registry
            .iter()
            .map(|(_, ind)| ind.lookback())
            .max()
            .unwrap_or(0)
    }

    /// Compute every registered column for `bars`.
    ///
    /// Never fails. Unusable price fields are blanked to NaN before any
    /// indicator runs, so only the indicators reading those fields lose
    /// values. Each affected field and each column with no defined value is
    /// reported in `diagnostics`.
    pub fn compute(&self, bars: &[PriceBar], diagnostics: &mut Diagnostics) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        if bars.is_empty() {
            for (column, _) in &self.registry {
                values.insert(*column, Vec::new());
            }
            return values;
        }

        scan_price_fields(bars, diagnostics);
        let bars = sanitize_bars(bars);

        for (column, indicator) in &self.registry {
            let series = indicator.compute(&bars);
            debug_assert_eq!(
                series.len(),
                bars.len(),
                "indicator '{}' produced {} values for {} bars",
                indicator.name(),
                series.len(),
                bars.len()
            );

            if series.iter().all(|v| v.is_nan()) {
                let required = indicator.lookback() + 1;
                if bars.len() < required {
                    diagnostics.push(Diagnostic::InsufficientHistory {
                        stage: (*column).to_string(),
                        bars: bars.len(),
                        required,
                    });
                } else {
                    diagnostics.push(Diagnostic::IndicatorUndefined {
                        column: (*column).to_string(),
                    });
                }
            }

            values.insert(*column, series);
        }

        tracing::debug!(
            bars = bars.len(),
            columns = values.len(),
            "indicator columns computed"
        );
        values
    }
}

/// Replace every unusable OHLC value (missing, non-finite, non-positive)
/// with NaN. Borrows when nothing needs replacing.
pub fn sanitize_bars(bars: &[PriceBar]) -> Cow<'_, [PriceBar]> {
    if !bars.iter().any(|b| b.is_void()) {
        return Cow::Borrowed(bars);
    }
    let cleaned = bars
        .iter()
        .map(|bar| {
            let mut bar = bar.clone();
            for field in PriceField::PRICES {
                if !PriceBar::is_valid_price(bar.field(field)) {
                    match field {
                        PriceField::Open => bar.open = f64::NAN,
                        PriceField::High => bar.high = f64::NAN,
                        PriceField::Low => bar.low = f64::NAN,
                        PriceField::Close => bar.close = f64::NAN,
                        PriceField::Volume => {}
                    }
                }
            }
            bar
        })
        .collect();
    Cow::Owned(cleaned)
}
