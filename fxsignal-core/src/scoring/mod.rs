//! Signal scoring engine: weighted multi-factor vote per bar.
//!
//! Each bar from `ScoringConfig::window` onward is scored over its trailing
//! window. Scoring is a pure function of that window and the config, so bars
//! may be scored in any order, including in parallel once every indicator
//! column exists.

pub mod factors;
pub mod window;

pub use factors::{bollinger_vote, macd_vote, rsi_vote, Factor, FactorVote};
pub use window::ScoringWindow;

use crate::components::indicator::IndicatorValues;
use crate::config::ScoringConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::domain::{PriceBar, SignalDirection, SignalRecord};
use rayon::prelude::*;

/// Direction chosen when the weighted vote sums to exactly zero.
pub const TIE_BREAK_DIRECTION: SignalDirection = SignalDirection::Sell;

/// Take-profit distance of an emitted signal, in ATRs from entry.
pub const SIGNAL_TAKE_PROFIT_ATR: f64 = 2.0;

/// Stop-loss distance of an emitted signal, in ATRs from entry.
pub const SIGNAL_STOP_LOSS_ATR: f64 = 1.0;

/// Per-bar fault. The bar reverts to neutral and the run continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("close is undefined on an emitting bar")]
    UndefinedClose,

    #[error("ATR is undefined on an emitting bar")]
    UndefinedAtr,

    #[error("confidence is not finite ({0})")]
    NonFiniteConfidence(f64),

    #[error("computed level is not finite")]
    NonFiniteLevel,
}

/// Aggregated factor votes for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub votes: Vec<FactorVote>,
    /// Sum of direction × confidence.
    pub weighted: f64,
    /// Sum of confidences.
    pub total: f64,
    /// MACD or its signal line is undefined. The bar cannot be scored.
    pub incomplete: bool,
}

impl Tally {
    pub fn direction(&self) -> SignalDirection {
        if self.weighted > 0.0 {
            SignalDirection::Buy
        } else if self.weighted < 0.0 {
            SignalDirection::Sell
        } else {
            TIE_BREAK_DIRECTION
        }
    }
}

/// Collect the factor votes for the window's last bar.
pub fn tally(window: &ScoringWindow<'_>, config: &ScoringConfig) -> Tally {
    let macd = macd_vote(
        ScoringWindow::latest(window.macd),
        ScoringWindow::latest(window.macd_signal),
        config,
    );
    let incomplete = macd.is_none();
    let votes: Vec<FactorVote> = [
        rsi_vote(ScoringWindow::latest(window.rsi), config),
        macd,
        bollinger_vote(
            window.close(),
            ScoringWindow::latest(window.bollinger_upper),
            ScoringWindow::latest(window.bollinger_lower),
            config,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    let weighted = votes.iter().map(|v| v.direction.sign() * v.confidence).sum();
    let total = votes.iter().map(|v| v.confidence).sum();
    Tally {
        votes,
        weighted,
        total,
        incomplete,
    }
}

/// Score the last bar of `window`.
///
/// Neutral when the MACD lines are not yet defined, when no factor votes,
/// or when the summed confidence stays below the threshold. An emitted signal enters at the close with take-profit and
/// stop-loss at `SIGNAL_TAKE_PROFIT_ATR` / `SIGNAL_STOP_LOSS_ATR` ATRs.
pub fn score_bar(
    window: &ScoringWindow<'_>,
    config: &ScoringConfig,
) -> Result<SignalRecord, ScoreError> {
    let tally = tally(window, config);
    if tally.incomplete || tally.votes.is_empty() {
        return Ok(SignalRecord::neutral());
    }
    if !tally.total.is_finite() {
        return Err(ScoreError::NonFiniteConfidence(tally.total));
    }
    if tally.total < config.confidence_threshold {
        return Ok(SignalRecord::neutral());
    }

    let direction = tally.direction();
    let entry = window.close().ok_or(ScoreError::UndefinedClose)?;
    let atr = ScoringWindow::latest(window.atr).ok_or(ScoreError::UndefinedAtr)?;
    let sign = direction.sign();
    let take_profit = entry + sign * SIGNAL_TAKE_PROFIT_ATR * atr;
    let stop_loss = entry - sign * SIGNAL_STOP_LOSS_ATR * atr;
    if !(take_profit.is_finite() && stop_loss.is_finite()) {
        return Err(ScoreError::NonFiniteLevel);
    }

    Ok(SignalRecord {
        signal: direction,
        confidence: tally.total.min(1.0),
        entry_price: entry,
        take_profit,
        stop_loss,
    })
}

/// Score every bar of a series.
///
/// Series shorter than `config.window` are not scored at all: every bar gets
/// `SignalRecord::unscored(close)`. Otherwise bars before `config.window`
/// stay neutral and each later bar is scored over its trailing
/// `config.window + 1` bars. Faults are recorded as diagnostics and the bar
/// stays neutral.
pub fn score_series(
    bars: &[PriceBar],
    values: &IndicatorValues,
    config: &ScoringConfig,
    parallel: bool,
    diagnostics: &mut Diagnostics,
) -> Vec<SignalRecord> {
    let n = bars.len();
    if n < config.window {
        if n > 0 {
            diagnostics.push(Diagnostic::InsufficientHistory {
                stage: "scoring".to_string(),
                bars: n,
                required: config.window,
            });
        }
        return bars.iter().map(|b| SignalRecord::unscored(b.close)).collect();
    }

    let span = config.window + 1;
    let score_at = |i: usize| -> (usize, Result<SignalRecord, ScoreError>) {
        let result = match ScoringWindow::new(bars, values, i, span) {
            Some(window) => score_bar(&window, config),
            None => Ok(SignalRecord::neutral()),
        };
        (i, result)
    };

    let scored: Vec<(usize, Result<SignalRecord, ScoreError>)> = if parallel {
        (config.window..n).into_par_iter().map(score_at).collect()
    } else {
        (config.window..n).map(score_at).collect()
    };

    let mut records = vec![SignalRecord::neutral(); n];
    for (i, result) in scored {
        match result {
            Ok(record) => records[i] = record,
            Err(err) => diagnostics.push(Diagnostic::ScoringFault {
                bar_index: i,
                reason: err.to_string(),
            }),
        }
    }

    tracing::debug!(
        bars = n,
        signals = records.iter().filter(|r| !r.signal.is_neutral()).count(),
        parallel,
        "scoring pass complete"
    );
    records
}
