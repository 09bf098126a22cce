//! FxSignal Runner: run orchestration around `fxsignal-core`.
//!
//! This crate provides:
//! - TOML run configuration and currency pair parsing
//! - Price sources (CSV, Parquet, seeded synthetic walk)
//! - Canonicalisation, date filtering and resampling of loaded bars
//! - Table sinks (CSV, Parquet, JSON lines)
//! - Logging setup for binaries

pub mod config;
pub mod data_loader;
pub mod logging;
pub mod pair;
pub mod runner;
pub mod sink;
pub mod source;

pub use config::{OutputConfig, OutputFormat, RunConfig, RunConfigError, SourceConfig};
pub use data_loader::{load_bars, LoadOptions, LoadedData};
pub use logging::{init_logging, LogFormat};
pub use pair::{CurrencyPair, PairError};
pub use runner::{prepare, run, RunError, RunReport};
pub use sink::{sink_for, SinkError, TableSink};
pub use source::{source_for, LoadError, PriceSource};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn sources_are_send_sync() {
        assert_send::<source::CsvSource>();
        assert_sync::<source::SyntheticSource>();
        assert_send::<Box<dyn PriceSource>>();
    }
}
