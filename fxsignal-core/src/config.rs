//! Engine configuration: indicator windows, bracket multipliers and scoring
//! parameters.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be at least 1")]
    ZeroWindow { field: &'static str },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    NegativeWeight { field: &'static str, value: f64 },

    #[error("confidence_threshold must be in (0, 1], got {0}")]
    Threshold(f64),

    #[error("factor weights sum to {0}, which exceeds 1")]
    WeightSum(f64),

    #[error("MACD fast window ({fast}) must be shorter than slow window ({slow})")]
    MacdWindows { fast: usize, slow: usize },

    #[error("RSI bounds must satisfy 0 <= oversold ({oversold}) < overbought ({overbought}) <= 100")]
    RsiBounds { oversold: f64, overbought: f64 },
}

/// Indicator windows. Column names stay fixed whatever the windows are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorConfig {
    pub sma_window: usize,
    pub ema_window: usize,
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_window: usize,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub vwap_window: usize,
    pub envelope_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_window: 20,
            ema_window: 20,
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_window: 14,
            bollinger_window: 20,
            bollinger_std: 2.0,
            vwap_window: 5,
            envelope_window: 20,
        }
    }
}

/// Volatility multipliers of the bracket-level calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BracketConfig {
    pub atr_multiplier_tp: f64,
    pub atr_multiplier_sl: f64,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            atr_multiplier_tp: 1.5,
            atr_multiplier_sl: 1.0,
        }
    }
}

/// Factor weights and thresholds of the signal scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Bars of history before the first scored bar. Bar `i` is scored over
    /// the trailing `window + 1` bars ending at `i`.
    pub window: usize,
    pub confidence_threshold: f64,
    pub rsi_weight: f64,
    pub macd_weight: f64,
    pub bollinger_weight: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_scale: f64,
    pub macd_scale: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window: 20,
            confidence_threshold: 0.8,
            rsi_weight: 0.3,
            macd_weight: 0.3,
            bollinger_weight: 0.4,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_scale: 10.0,
            macd_scale: 0.0005,
        }
    }
}

impl ScoringConfig {
    pub fn weight_sum(&self) -> f64 {
        self.rsi_weight + self.macd_weight + self.bollinger_weight
    }
}

/// Complete engine configuration.
///
/// ```toml
/// breakout_window = 20
/// parallel = false
///
/// [indicators]
/// rsi_window = 14
///
/// [bracket]
/// atr_multiplier_tp = 1.5
///
/// [scoring]
/// confidence_threshold = 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub bracket: BracketConfig,
    pub scoring: ScoringConfig,
    /// Window used when the breakout detector has to compute its own envelope.
    pub breakout_window: usize,
    /// Score bars across the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfig::default(),
            bracket: BracketConfig::default(),
            scoring: ScoringConfig::default(),
            breakout_window: 20,
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        let windows = [
            ("indicators.sma_window", ind.sma_window),
            ("indicators.ema_window", ind.ema_window),
            ("indicators.rsi_window", ind.rsi_window),
            ("indicators.macd_fast", ind.macd_fast),
            ("indicators.macd_slow", ind.macd_slow),
            ("indicators.macd_signal", ind.macd_signal),
            ("indicators.atr_window", ind.atr_window),
            ("indicators.bollinger_window", ind.bollinger_window),
            ("indicators.vwap_window", ind.vwap_window),
            ("indicators.envelope_window", ind.envelope_window),
            ("scoring.window", self.scoring.window),
            ("breakout_window", self.breakout_window),
        ];
        for (field, value) in windows {
            if value == 0 {
                return Err(ConfigError::ZeroWindow { field });
            }
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::MacdWindows {
                fast: ind.macd_fast,
                slow: ind.macd_slow,
            });
        }

        let sc = &self.scoring;
        let positives = [
            ("indicators.bollinger_std", ind.bollinger_std),
            ("bracket.atr_multiplier_tp", self.bracket.atr_multiplier_tp),
            ("bracket.atr_multiplier_sl", self.bracket.atr_multiplier_sl),
            ("scoring.rsi_scale", sc.rsi_scale),
            ("scoring.macd_scale", sc.macd_scale),
        ];
        for (field, value) in positives {
            // NaN fails this comparison too
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if !(sc.confidence_threshold > 0.0 && sc.confidence_threshold <= 1.0) {
            return Err(ConfigError::Threshold(sc.confidence_threshold));
        }

        let weights = [
            ("scoring.rsi_weight", sc.rsi_weight),
            ("scoring.macd_weight", sc.macd_weight),
            ("scoring.bollinger_weight", sc.bollinger_weight),
        ];
        for (field, value) in weights {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::NegativeWeight { field, value });
            }
        }
        // Tolerate rounding in sums such as 0.3 + 0.3 + 0.4
        let sum = sc.weight_sum();
        if sum > 1.0 + 1e-9 {
            return Err(ConfigError::WeightSum(sum));
        }

        if !(0.0 <= sc.rsi_oversold
            && sc.rsi_oversold < sc.rsi_overbought
            && sc.rsi_overbought <= 100.0)
        {
            return Err(ConfigError::RsiBounds {
                oversold: sc.rsi_oversold,
                overbought: sc.rsi_overbought,
            });
        }

        Ok(())
    }

    /// Longest indicator warmup, in bars.
    pub fn max_lookback(&self) -> usize {
        let ind = &self.indicators;
        [
            ind.sma_window.saturating_sub(1),
            ind.ema_window.saturating_sub(1),
            ind.rsi_window,
            (ind.macd_slow + ind.macd_signal).saturating_sub(2),
            ind.atr_window,
            ind.bollinger_window.saturating_sub(1),
            ind.vwap_window.saturating_sub(1),
            ind.envelope_window.saturating_sub(1),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}
