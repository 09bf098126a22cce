//! Run orchestration: load → enrich → write.
//!
//! Two entry points:
//! - `prepare()`: loads bars and builds the enriched table, no output I/O.
//! - `run()`: `prepare()` then writes the table to the configured sink.

use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use fxsignal_core::pipeline::build_with_diagnostics;
use fxsignal_core::{Diagnostic, EnrichedTable, TableError, TableSummary};

use crate::config::{RunConfig, RunConfigError, RunId};
use crate::data_loader::{load_bars, LoadOptions};
use crate::pair::CurrencyPair;
use crate::sink::{sink_for, SinkError};
use crate::source::{source_for, LoadError};

/// Signals listed in a report's summary.
pub const RECENT_SIGNALS: usize = 5;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("enrichment error: {0}")]
    Table(#[from] TableError),
    #[error("output error: {0}")]
    Sink(#[from] SinkError),
}

/// Provenance and headline numbers of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub pair: CurrencyPair,
    pub generated_at: NaiveDateTime,
    /// BLAKE3 of the canonical input bars.
    pub dataset_hash: String,
    /// BLAKE3 of the enriched table.
    pub table_fingerprint: String,
    pub synthetic: bool,
    pub summary: TableSummary,
    pub diagnostics: Vec<Diagnostic>,
    pub output: Option<PathBuf>,
}

impl LoadOptions {
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            start: config.start,
            end: config.end,
            resample: config
                .resample_minutes
                .map(|m| Duration::minutes(i64::from(m))),
        }
    }
}

/// Load and enrich without writing anything.
pub fn prepare(config: &RunConfig) -> Result<(EnrichedTable, RunReport), RunError> {
    config.validate()?;
    let run_id = config.run_id()?;

    let source = source_for(&config.source, &config.pair);
    let loaded = load_bars(source.as_ref(), &LoadOptions::from_run_config(config))?;
    let table = build_with_diagnostics(loaded.bars, &config.engine, loaded.diagnostics)?;

    let report = RunReport {
        run_id,
        pair: config.pair.clone(),
        generated_at: chrono::Utc::now().naive_utc(),
        dataset_hash: loaded.dataset_hash,
        table_fingerprint: table.fingerprint(),
        synthetic: loaded.synthetic,
        summary: table.summary(RECENT_SIGNALS),
        diagnostics: table.diagnostics().iter().cloned().collect(),
        output: None,
    };
    Ok((table, report))
}

/// Load, enrich and write to the configured output, if any.
pub fn run(config: &RunConfig) -> Result<(EnrichedTable, RunReport), RunError> {
    let (table, mut report) = prepare(config)?;

    if let Some(output) = &config.output {
        let sink = sink_for(output.format, &output.path, &config.pair);
        sink.write(&table)?;
        report.output = Some(sink.path().to_path_buf());
    }

    tracing::info!(
        pair = %config.pair,
        bars = report.summary.bars,
        buys = report.summary.buy_signals,
        sells = report.summary.sell_signals,
        warnings = report.summary.warnings,
        output = ?report.output,
        "run complete"
    );
    Ok((table, report))
}
