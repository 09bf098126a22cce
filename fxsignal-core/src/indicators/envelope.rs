//! Support / resistance envelope: highest high and lowest low over a
//! trailing window.
//!
//! Two series (separate Indicator instances):
//! - Resistance: max(high[t-period+1..=t])
//! - Support: min(low[t-period+1..=t])
//!
//! Lookback: period - 1.

use super::rolling_window;
use crate::components::indicator::Indicator;
use crate::domain::PriceBar;

/// Which side of the envelope to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeBand {
    Resistance,
    Support,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    period: usize,
    band: EnvelopeBand,
    name: String,
}

impl Envelope {
    pub fn resistance(period: usize) -> Self {
        assert!(period >= 1, "Envelope period must be >= 1");
        Self {
            period,
            band: EnvelopeBand::Resistance,
            name: format!("resistance_{period}"),
        }
    }

    pub fn support(period: usize) -> Self {
        assert!(period >= 1, "Envelope period must be >= 1");
        Self {
            period,
            band: EnvelopeBand::Support,
            name: format!("support_{period}"),
        }
    }
}

impl Indicator for Envelope {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        match self.band {
            EnvelopeBand::Resistance => {
                let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
                rolling_window(&highs, self.period, |w| {
                    w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                })
            }
            EnvelopeBand::Support => {
                let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
                rolling_window(&lows, self.period, |w| {
                    w.iter().copied().fold(f64::INFINITY, f64::min)
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    fn sample() -> Vec<PriceBar> {
        make_ohlc_bars(&[
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 15.0, 10.0, 14.0),
            (14.0, 14.0, 13.0, 13.5),
            (13.5, 16.0, 12.0, 15.0),
            (15.0, 15.5, 14.0, 14.5),
        ])
    }

    #[test]
    fn resistance_3() {
        let result = Envelope::resistance(3).compute(&sample());
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 15.0, DEFAULT_EPSILON);
        assert_approx(result[3], 16.0, DEFAULT_EPSILON);
        assert_approx(result[4], 16.0, DEFAULT_EPSILON);
    }

    #[test]
    fn support_3() {
        let result = Envelope::support(3).compute(&sample());
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 9.0, DEFAULT_EPSILON);
        assert_approx(result[3], 10.0, DEFAULT_EPSILON);
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn envelope_nan_is_field_local() {
        let mut bars = sample();
        bars[1].high = f64::NAN;
        let upper = Envelope::resistance(3).compute(&bars);
        let lower = Envelope::support(3).compute(&bars);
        assert!(upper[2].is_nan());
        assert!(upper[3].is_nan());
        assert_approx(upper[4], 16.0, DEFAULT_EPSILON);
        // Support reads lows only
        assert_approx(lower[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn envelope_lookback() {
        assert_eq!(Envelope::resistance(20).lookback(), 19);
        assert_eq!(Envelope::support(1).lookback(), 0);
    }
}
