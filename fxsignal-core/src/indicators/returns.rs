//! Bar-over-bar close returns.
//!
//! Simple: (close[t] - close[t-1]) / close[t-1]
//! Log: ln(close[t] / close[t-1])
//! Lookback: 1.

use crate::components::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnsKind {
    Simple,
    Log,
}

#[derive(Debug, Clone)]
pub struct Returns {
    kind: ReturnsKind,
}

impl Returns {
    pub fn simple() -> Self {
        Self {
            kind: ReturnsKind::Simple,
        }
    }

    pub fn log() -> Self {
        Self {
            kind: ReturnsKind::Log,
        }
    }
}

impl Indicator for Returns {
    fn name(&self) -> &str {
        match self.kind {
            ReturnsKind::Simple => "returns",
            ReturnsKind::Log => "log_returns",
        }
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        for i in 1..bars.len() {
            let prev = bars[i - 1].close;
            let curr = bars[i].close;
            if !(PriceBar::is_valid_price(prev) && PriceBar::is_valid_price(curr)) {
                continue;
            }
            result[i] = match self.kind {
                ReturnsKind::Simple => (curr - prev) / prev,
                ReturnsKind::Log => (curr / prev).ln(),
            };
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn simple_returns() {
        let bars = make_bars(&[1.00, 1.10, 0.99]);
        let r = Returns::simple().compute(&bars);
        assert!(r[0].is_nan());
        assert_approx(r[1], 0.1, 1e-12);
        assert_approx(r[2], -0.1, 1e-12);
    }

    #[test]
    fn log_returns() {
        let bars = make_bars(&[1.00, 1.10, 0.99]);
        let r = Returns::log().compute(&bars);
        assert!(r[0].is_nan());
        assert_approx(r[1], 1.1f64.ln(), DEFAULT_EPSILON);
        assert_approx(r[2], 0.9f64.ln(), 1e-12);
    }

    #[test]
    fn returns_undefined_around_bad_close() {
        let mut bars = make_bars(&[1.00, 1.10, 1.20, 1.30]);
        bars[1].close = f64::NAN;
        let r = Returns::simple().compute(&bars);
        assert!(r[1].is_nan());
        assert!(r[2].is_nan());
        assert_approx(r[3], 0.1 / 1.2, 1e-12);
    }

    #[test]
    fn returns_lookback() {
        assert_eq!(Returns::log().lookback(), 1);
    }
}
