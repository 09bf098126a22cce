//! Table sinks: CSV, Parquet and JSON-lines writers for an enriched table.
//!
//! All sinks emit columns in `ENRICHED_SCHEMA` order under the schema's
//! names. Undefined values are written as empty CSV cells, Parquet nulls
//! or JSON `null`. Files are written to a temporary sibling and renamed
//! into place so a failed write never leaves a truncated output.

use crate::config::OutputFormat;
use crate::pair::CurrencyPair;
use fxsignal_core::schema::{columns, ENRICHED_SCHEMA};
use fxsignal_core::table::EnrichedRow;
use fxsignal_core::{EnrichedTable, PriceBar, TableError};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] PolarsError),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// A destination for an enriched table.
pub trait TableSink {
    fn write(&self, table: &EnrichedTable) -> Result<(), SinkError>;

    fn path(&self) -> &Path;
}

/// Build the sink for an output format.
pub fn sink_for(format: OutputFormat, path: &Path, pair: &CurrencyPair) -> Box<dyn TableSink> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(path)),
        OutputFormat::Parquet => Box::new(ParquetSink::new(path)),
        OutputFormat::Json => Box::new(JsonSink::new(path, pair.clone())),
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write through a temporary sibling file, then rename over `path`.
fn write_atomic(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> Result<(), SinkError>,
) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let tmp = path.with_extension("tmp");
    let file = File::create(&tmp).map_err(io_err(&tmp))?;
    let mut writer = BufWriter::new(file);
    let result = body(&mut writer).and_then(|()| writer.flush().map_err(io_err(&tmp)));
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    drop(writer);
    std::fs::rename(&tmp, path).map_err(io_err(path))?;
    tracing::debug!(path = %path.display(), "table written");
    Ok(())
}

// ── CSV ─────────────────────────────────────────────────────────────

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// One CSV record in schema order.
fn csv_record(table: &EnrichedTable, i: usize) -> Vec<String> {
    let bar: &PriceBar = &table.bars()[i];
    let brackets = table.brackets()[i];
    let signal = table.signals()[i];
    ENRICHED_SCHEMA
        .iter()
        .map(|field| match field.name {
            columns::TIMESTAMP => bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            columns::OPEN => cell(defined(bar.open)),
            columns::HIGH => cell(defined(bar.high)),
            columns::LOW => cell(defined(bar.low)),
            columns::CLOSE => cell(defined(bar.close)),
            columns::VOLUME => cell(defined(bar.volume)),
            columns::BREAKOUT => table.breakouts()[i].as_i8().to_string(),
            columns::TP_LONG => cell(defined(brackets.tp_long)),
            columns::SL_LONG => cell(defined(brackets.sl_long)),
            columns::TP_SHORT => cell(defined(brackets.tp_short)),
            columns::SL_SHORT => cell(defined(brackets.sl_short)),
            columns::SIGNAL => signal.signal.as_i8().to_string(),
            columns::CONFIDENCE => cell(defined(signal.confidence)),
            columns::ENTRY_PRICE => cell(defined(signal.entry_price)),
            columns::TAKE_PROFIT => cell(defined(signal.take_profit)),
            columns::STOP_LOSS => cell(defined(signal.stop_loss)),
            indicator => cell(table.indicators().defined(indicator, i)),
        })
        .collect()
}

impl TableSink for CsvSink {
    fn write(&self, table: &EnrichedTable) -> Result<(), SinkError> {
        write_atomic(&self.path, |out| {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record(ENRICHED_SCHEMA.iter().map(|f| f.name))?;
            for i in 0..table.len() {
                wtr.write_record(csv_record(table, i))?;
            }
            wtr.flush().map_err(io_err(&self.path))?;
            Ok(())
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

// ── Parquet ─────────────────────────────────────────────────────────

pub struct ParquetSink {
    path: PathBuf,
}

impl ParquetSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSink for ParquetSink {
    fn write(&self, table: &EnrichedTable) -> Result<(), SinkError> {
        let mut df = table.to_dataframe()?;
        write_atomic(&self.path, |out| {
            ParquetWriter::new(out).finish(&mut df)?;
            Ok(())
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

// ── JSON lines ──────────────────────────────────────────────────────

/// One JSON object per row, tagged with the pair.
pub struct JsonSink {
    path: PathBuf,
    pair: CurrencyPair,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>, pair: CurrencyPair) -> Self {
        Self {
            path: path.into(),
            pair,
        }
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    pair: &'a CurrencyPair,
    #[serde(flatten)]
    row: EnrichedRow,
}

impl TableSink for JsonSink {
    fn write(&self, table: &EnrichedTable) -> Result<(), SinkError> {
        write_atomic(&self.path, |out| {
            for row in table.rows() {
                serde_json::to_writer(
                    &mut *out,
                    &JsonLine {
                        pair: &self.pair,
                        row,
                    },
                )?;
                out.write_all(b"\n").map_err(io_err(&self.path))?;
            }
            Ok(())
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
