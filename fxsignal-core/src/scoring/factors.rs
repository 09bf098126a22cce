//! Factor votes: RSI extremes, MACD vs its signal line, Bollinger band
//! excursions.
//!
//! RSI and Bollinger either abstain (`None`) or vote a direction with a
//! weighted confidence in `[0, weight]`. MACD always votes once both of its
//! lines exist; before that it returns `None` and the whole bar is left
//! neutral by the tally.

use crate::config::ScoringConfig;
use crate::domain::SignalDirection;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Factor {
    Rsi,
    Macd,
    Bollinger,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorVote {
    pub factor: Factor,
    pub direction: SignalDirection,
    pub confidence: f64,
}

impl FactorVote {
    fn new(factor: Factor, direction: SignalDirection, strength: f64, weight: f64) -> Self {
        Self {
            factor,
            direction,
            confidence: strength.min(1.0) * weight,
        }
    }
}

/// RSI below the oversold bound votes buy, above the overbought bound votes
/// sell. Strength grows linearly over `rsi_scale` points past the bound.
pub fn rsi_vote(rsi: Option<f64>, config: &ScoringConfig) -> Option<FactorVote> {
    let rsi = rsi?;
    if rsi < config.rsi_oversold {
        let strength = (config.rsi_oversold - rsi) / config.rsi_scale;
        Some(FactorVote::new(
            Factor::Rsi,
            SignalDirection::Buy,
            strength,
            config.rsi_weight,
        ))
    } else if rsi > config.rsi_overbought {
        let strength = (rsi - config.rsi_overbought) / config.rsi_scale;
        Some(FactorVote::new(
            Factor::Rsi,
            SignalDirection::Sell,
            strength,
            config.rsi_weight,
        ))
    } else {
        None
    }
}

/// MACD above its signal line votes buy, otherwise sell. Strength is the
/// gap over `macd_scale`. `None` when either line is undefined, which the
/// tally treats as an incomplete bar rather than an abstention.
pub fn macd_vote(
    macd: Option<f64>,
    signal: Option<f64>,
    config: &ScoringConfig,
) -> Option<FactorVote> {
    let (macd, signal) = (macd?, signal?);
    let direction = if macd > signal {
        SignalDirection::Buy
    } else {
        SignalDirection::Sell
    };
    let strength = (macd - signal).abs() / config.macd_scale;
    Some(FactorVote::new(
        Factor::Macd,
        direction,
        strength,
        config.macd_weight,
    ))
}

/// Close below the lower band votes buy, above the upper band votes sell.
/// Strength is the excursion relative to the band width. A degenerate band
/// (width zero, negative or undefined) abstains.
pub fn bollinger_vote(
    close: Option<f64>,
    upper: Option<f64>,
    lower: Option<f64>,
    config: &ScoringConfig,
) -> Option<FactorVote> {
    let (close, upper, lower) = (close?, upper?, lower?);
    let width = upper - lower;
    if !(width > 0.0 && width.is_finite()) {
        return None;
    }
    if close < lower {
        Some(FactorVote::new(
            Factor::Bollinger,
            SignalDirection::Buy,
            (lower - close) / width,
            config.bollinger_weight,
        ))
    } else if close > upper {
        Some(FactorVote::new(
            Factor::Bollinger,
            SignalDirection::Sell,
            (close - upper) / width,
            config.bollinger_weight,
        ))
    } else {
        None
    }
}
