//! Borrowed view over the trailing window a bar is scored on.

use crate::components::indicator::IndicatorValues;
use crate::domain::PriceBar;
use crate::schema::columns;

/// Trailing slice of bars and the indicator columns the scorer reads.
///
/// Every slice has the same length and ends at the scored bar. A column
/// missing from the source container is `None`, which scores exactly like
/// an undefined value.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWindow<'a> {
    /// Index of the scored bar in the full series.
    pub bar_index: usize,
    pub bars: &'a [PriceBar],
    pub rsi: Option<&'a [f64]>,
    pub macd: Option<&'a [f64]>,
    pub macd_signal: Option<&'a [f64]>,
    pub bollinger_upper: Option<&'a [f64]>,
    pub bollinger_lower: Option<&'a [f64]>,
    pub atr: Option<&'a [f64]>,
}

impl<'a> ScoringWindow<'a> {
    /// View of the `len` bars ending at `end` (inclusive).
    ///
    /// Returns `None` when fewer than `len` bars exist up to `end`, or when
    /// `end` is outside the series.
    pub fn new(
        bars: &'a [PriceBar],
        values: &'a IndicatorValues,
        end: usize,
        len: usize,
    ) -> Option<Self> {
        if len == 0 || end >= bars.len() || end + 1 < len {
            return None;
        }
        let start = end + 1 - len;
        let slice = |name: &str| {
            values
                .get_series(name)
                .filter(|s| s.len() == bars.len())
                .map(|s| &s[start..=end])
        };
        Some(Self {
            bar_index: end,
            bars: &bars[start..=end],
            rsi: slice(columns::RSI),
            macd: slice(columns::MACD),
            macd_signal: slice(columns::MACD_SIGNAL),
            bollinger_upper: slice(columns::BOLLINGER_UPPER),
            bollinger_lower: slice(columns::BOLLINGER_LOWER),
            atr: slice(columns::ATR),
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The scored bar.
    pub fn current(&self) -> Option<&'a PriceBar> {
        self.bars.last()
    }

    /// Close of the scored bar, if usable.
    pub fn close(&self) -> Option<f64> {
        self.current()
            .map(|b| b.close)
            .filter(|c| PriceBar::is_valid_price(*c))
    }

    /// Latest defined value of a column slice.
    pub fn latest(series: Option<&[f64]>) -> Option<f64> {
        series
            .and_then(|s| s.last().copied())
            .filter(|v| !v.is_nan())
    }
}
