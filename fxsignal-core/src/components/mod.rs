//! Shared component traits.

pub mod indicator;

pub use indicator::{Indicator, IndicatorValues};
