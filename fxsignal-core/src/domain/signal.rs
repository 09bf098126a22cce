//! Per-bar outputs: signal records, breakout flags and bracket levels.

use serde::{Deserialize, Serialize};

/// Discrete trade direction. Serialized as -1 / 0 / +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum SignalDirection {
    Sell,
    #[default]
    Neutral,
    Buy,
}

impl SignalDirection {
    pub fn as_i8(self) -> i8 {
        match self {
            SignalDirection::Sell => -1,
            SignalDirection::Neutral => 0,
            SignalDirection::Buy => 1,
        }
    }

    /// Sign used when weighting a factor vote.
    pub fn sign(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn is_neutral(self) -> bool {
        self == SignalDirection::Neutral
    }
}

impl From<SignalDirection> for i8 {
    fn from(d: SignalDirection) -> i8 {
        d.as_i8()
    }
}

impl TryFrom<i8> for SignalDirection {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(SignalDirection::Sell),
            0 => Ok(SignalDirection::Neutral),
            1 => Ok(SignalDirection::Buy),
            other => Err(format!("invalid signal direction {other}")),
        }
    }
}

/// Scoring result for one bar.
///
/// Invariants: `confidence > 0` implies a non-neutral signal, and a
/// non-neutral signal carries a confidence at or above the threshold that
/// was active when it was scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub signal: SignalDirection,
    pub confidence: f64,
    pub entry_price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl SignalRecord {
    /// Default written by a scoring pass for bars that do not emit.
    pub fn neutral() -> Self {
        Self {
            signal: SignalDirection::Neutral,
            confidence: 0.0,
            entry_price: 0.0,
            take_profit: 0.0,
            stop_loss: 0.0,
        }
    }

    /// Default used when the series is too short for scoring to run at all:
    /// the price levels sit at the bar's close.
    pub fn unscored(close: f64) -> Self {
        Self {
            signal: SignalDirection::Neutral,
            confidence: 0.0,
            entry_price: close,
            take_profit: close,
            stop_loss: close,
        }
    }
}

impl Default for SignalRecord {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Crossing of the previous bar's support/resistance envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum BreakoutFlag {
    Bearish,
    #[default]
    None,
    Bullish,
}

impl BreakoutFlag {
    pub fn as_i8(self) -> i8 {
        match self {
            BreakoutFlag::Bearish => -1,
            BreakoutFlag::None => 0,
            BreakoutFlag::Bullish => 1,
        }
    }
}

impl From<BreakoutFlag> for i8 {
    fn from(f: BreakoutFlag) -> i8 {
        f.as_i8()
    }
}

impl TryFrom<i8> for BreakoutFlag {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(BreakoutFlag::Bearish),
            0 => Ok(BreakoutFlag::None),
            1 => Ok(BreakoutFlag::Bullish),
            other => Err(format!("invalid breakout flag {other}")),
        }
    }
}

/// Volatility-scaled take-profit / stop-loss levels for both postures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketLevels {
    pub tp_long: f64,
    pub sl_long: f64,
    pub tp_short: f64,
    pub sl_short: f64,
}

impl BracketLevels {
    pub fn undefined() -> Self {
        Self {
            tp_long: f64::NAN,
            sl_long: f64::NAN,
            tp_short: f64::NAN,
            sl_short: f64::NAN,
        }
    }
}
