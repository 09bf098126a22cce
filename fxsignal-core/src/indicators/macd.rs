//! Moving Average Convergence Divergence (MACD).
//!
//! Three outputs (separate Indicator instances):
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal), seeded at the first `signal` defined line values
//! - Histogram: line - signal
//!
//! Lookback: slow - 1 for the line, slow + signal - 2 for signal and histogram.

use super::ema::ema_of_series;
use crate::components::indicator::Indicator;
use crate::domain::PriceBar;

/// Which MACD series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdOutput) -> Self {
        assert!(fast >= 1, "MACD fast period must be >= 1");
        assert!(slow >= 1, "MACD slow period must be >= 1");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        let label = match output {
            MacdOutput::Line => "line",
            MacdOutput::Signal => "signal",
            MacdOutput::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdOutput::Line)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdOutput::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdOutput::Histogram)
    }
}

/// Compute (line, signal, histogram) for a close series.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> [Vec<f64>; 3] {
    let ema_fast = ema_of_series(closes, fast);
    let ema_slow = ema_of_series(closes, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&line, signal);
    let hist: Vec<f64> = line.iter().zip(&signal_line).map(|(l, s)| l - s).collect();
    [line, signal_line, hist]
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let line = self.fast.max(self.slow) - 1;
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal | MacdOutput::Histogram => line + self.signal - 1,
        }
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let [line, signal, hist] = macd_series(&closes, self.fast, self.slow, self.signal);
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => signal,
            MacdOutput::Histogram => hist,
        }
    }
}
