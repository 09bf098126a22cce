//! Domain types for fxsignal

pub mod bar;
pub mod signal;

pub use bar::{parse_timestamp, PriceBar, PriceField};
pub use signal::{BracketLevels, BreakoutFlag, SignalDirection, SignalRecord};
