//! Indicator engine: the first stage of every table build.
//!
//! Turns a bar series into named indicator columns. The breakout detector,
//! bracket calculator and signal scorer all run after it and only read its
//! output.

pub mod precompute;
pub mod snapshot;

pub use precompute::{sanitize_bars, IndicatorEngine};
pub use snapshot::IndicatorSet;
