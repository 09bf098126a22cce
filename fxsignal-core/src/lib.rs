//! fxsignal core: indicators, breakouts, bracket levels and signal scoring
//! for FX OHLC series.
//!
//! Data flows one way:
//! - the indicator engine computes every indicator column once
//! - the breakout detector flags closes outside the previous bar's envelope
//! - the bracket calculator derives long/short TP/SL levels from ATR
//! - the scoring engine votes RSI, MACD and Bollinger factors per bar
//!
//! [`pipeline::build_enriched_table`] runs all of it and returns an
//! [`EnrichedTable`] that exports to a polars `DataFrame`.

pub mod bracket;
pub mod breakout;
pub mod canonical;
pub mod components;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod pipeline;
pub mod resample;
pub mod schema;
pub mod scoring;
pub mod table;

pub use config::{ConfigError, EngineConfig};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use domain::{BracketLevels, BreakoutFlag, PriceBar, SignalDirection, SignalRecord};
pub use pipeline::build_enriched_table;
pub use table::{EnrichedRow, EnrichedTable, TableError, TableSummary};
