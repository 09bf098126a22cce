//! Price sources: where raw bars come from.
//!
//! Every source returns bars in file order with problems recorded as
//! diagnostics; canonical ordering and date filtering happen afterwards in
//! the data loader.

use crate::config::SourceConfig;
use crate::pair::CurrencyPair;
use chrono::{Datelike, Duration, NaiveDateTime, Weekday};
use fxsignal_core::diagnostics::{Diagnostic, Diagnostics};
use fxsignal_core::domain::{parse_timestamp, PriceBar, PriceField};
use fxsignal_core::table::bars_from_dataframe;
use fxsignal_core::TableError;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read Parquet {path}: {source}")]
    Parquet { path: PathBuf, source: PolarsError },

    #[error("{path}: {source}")]
    Frame { path: PathBuf, source: TableError },

    #[error("{path}: no timestamp column (expected 'timestamp', 'date' or 'datetime')")]
    MissingTimestamp { path: PathBuf },

    #[error("resample: {0}")]
    Resample(#[from] fxsignal_core::resample::ResampleError),
}

/// Bars as delivered by a source, before canonicalisation.
#[derive(Debug, Clone, Default)]
pub struct LoadedBars {
    pub bars: Vec<PriceBar>,
    pub diagnostics: Diagnostics,
    /// True when the bars are generated rather than observed.
    pub synthetic: bool,
}

/// A collaborator that can produce a raw bar series.
pub trait PriceSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<LoadedBars, LoadError>;
}

/// Build the source named by a run config.
pub fn source_for(config: &SourceConfig, pair: &CurrencyPair) -> Box<dyn PriceSource> {
    match config {
        SourceConfig::Csv { path } => Box::new(CsvSource::new(path)),
        SourceConfig::Parquet { path } => Box::new(ParquetSource::new(path)),
        SourceConfig::Synthetic {
            bars,
            start,
            interval_minutes,
            seed,
        } => Box::new(SyntheticSource {
            pair: pair.clone(),
            bars: *bars,
            start: *start,
            interval: Duration::minutes(i64::from(*interval_minutes)),
            seed: *seed,
        }),
    }
}

// ── CSV ─────────────────────────────────────────────────────────────

/// Header-mapped CSV file.
///
/// Column names are matched case-insensitively. The timestamp column may be
/// called `timestamp`, `date` or `datetime`; `volume` is optional. Cells
/// that do not parse as numbers are carried as NaN.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn fetch(&self) -> Result<LoadedBars, LoadError> {
        let csv_err = |source: csv::Error| LoadError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)
            .map_err(csv_err)?;
        let headers = reader.headers().map_err(csv_err)?.clone();
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let ts_idx = ["timestamp", "date", "datetime"]
            .into_iter()
            .find_map(|name| find(name))
            .ok_or_else(|| LoadError::MissingTimestamp {
                path: self.path.clone(),
            })?;

        let mut diagnostics = Diagnostics::new();
        let mut column = |field: PriceField| {
            let idx = find(field.column());
            if idx.is_none() && field != PriceField::Volume {
                diagnostics.push(Diagnostic::MissingColumn {
                    column: field.column().to_string(),
                });
            }
            idx
        };
        let open = column(PriceField::Open);
        let high = column(PriceField::High);
        let low = column(PriceField::Low);
        let close = column(PriceField::Close);
        let volume = column(PriceField::Volume);

        let mut bars = Vec::new();
        let mut unparseable = 0usize;
        let mut first_bad_row = None;
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let cell = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(f64::NAN)
            };
            let Some(ts) = record.get(ts_idx).and_then(parse_timestamp) else {
                unparseable += 1;
                first_bad_row.get_or_insert(row);
                continue;
            };
            let vol = cell(volume);
            bars.push(
                PriceBar::new(ts, cell(open), cell(high), cell(low), cell(close))
                    .with_volume(if vol.is_finite() { vol } else { 0.0 }),
            );
        }

        if let Some(first_row) = first_bad_row {
            diagnostics.push(Diagnostic::UnparseableTimestamps {
                count: unparseable,
                first_row,
            });
        }
        tracing::debug!(path = %self.path.display(), bars = bars.len(), "csv loaded");
        Ok(LoadedBars {
            bars,
            diagnostics,
            synthetic: false,
        })
    }
}

// ── Parquet ─────────────────────────────────────────────────────────

/// Parquet file, e.g. one written by `ParquetSink`.
pub struct ParquetSource {
    path: PathBuf,
}

impl ParquetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for ParquetSource {
    fn describe(&self) -> String {
        format!("parquet:{}", self.path.display())
    }

    fn fetch(&self) -> Result<LoadedBars, LoadError> {
        let file = std::fs::File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|source| LoadError::Parquet {
                path: self.path.clone(),
                source,
            })?;

        let mut diagnostics = Diagnostics::new();
        let bars = bars_from_dataframe(&df, &mut diagnostics).map_err(|source| match source {
            TableError::MissingTimestamp => LoadError::MissingTimestamp {
                path: self.path.clone(),
            },
            source => LoadError::Frame {
                path: self.path.clone(),
                source,
            },
        })?;
        tracing::debug!(path = %self.path.display(), bars = bars.len(), "parquet loaded");
        Ok(LoadedBars {
            bars,
            diagnostics,
            synthetic: false,
        })
    }
}

// ── Synthetic ───────────────────────────────────────────────────────

/// Seeded random walk with FX-like magnitudes.
///
/// The same pair and seed always produce the same bars. A timestamp that
/// lands on a weekend moves to the following Monday at the same time of
/// day. Bars are tagged synthetic.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub pair: CurrencyPair,
    pub bars: usize,
    pub start: NaiveDateTime,
    pub interval: Duration,
    pub seed: u64,
}

impl SyntheticSource {
    fn start_price(&self) -> f64 {
        if self.pair.quote() == "JPY" {
            150.0
        } else {
            1.10
        }
    }
}

impl PriceSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("synthetic:{}:{}", self.pair, self.seed)
    }

    fn fetch(&self) -> Result<LoadedBars, LoadError> {
        let seed_bytes = blake3::hash(format!("{}:{}", self.pair, self.seed).as_bytes());
        let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

        let mut bars = Vec::with_capacity(self.bars);
        let mut price = self.start_price();
        let mut ts = self.start;
        let step = if self.interval > Duration::zero() {
            self.interval
        } else {
            Duration::hours(1)
        };

        while bars.len() < self.bars {
            if matches!(ts.weekday(), Weekday::Sat | Weekday::Sun) {
                // Monday, same time of day
                let days = 7 - i64::from(ts.weekday().num_days_from_monday());
                ts += Duration::days(days);
            }
            let ret: f64 = rng.gen_range(-0.0015..0.0015);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0008));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0008));
            let volume = f64::from(rng.gen_range(100..5_000u32));
            bars.push(PriceBar::new(ts, open, high, low, close).with_volume(volume));
            price = close;
            ts += step;
        }

        Ok(LoadedBars {
            bars,
            diagnostics: Diagnostics::new(),
            synthetic: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_maps_headers_case_insensitively() {
        let file = write_csv(
            "Date,OPEN,high,Low,close,Volume\n\
             2024-01-02 00:00:00,1.10,1.12,1.09,1.11,100\n\
             2024-01-02 01:00:00,1.11,1.13,1.10,1.12,\n",
        );
        let loaded = CsvSource::new(file.path()).fetch().unwrap();
        assert_eq!(loaded.bars.len(), 2);
        assert_eq!(loaded.bars[0].open, 1.10);
        assert_eq!(loaded.bars[0].volume, 100.0);
        assert_eq!(loaded.bars[1].volume, 0.0);
        assert!(loaded.diagnostics.is_empty());
        assert!(!loaded.synthetic);
    }

    #[test]
    fn csv_coerces_bad_cells_and_drops_bad_timestamps() {
        let file = write_csv(
            "timestamp,open,high,low,close\n\
             2024-01-02 00:00,1.10,1.12,1.09,abc\n\
             not-a-date,1.11,1.13,1.10,1.12\n\
             2024-01-02 02:00,1.12,1.14,1.11,1.13\n",
        );
        let loaded = CsvSource::new(file.path()).fetch().unwrap();
        assert_eq!(loaded.bars.len(), 2);
        assert!(loaded.bars[0].close.is_nan());
        assert_eq!(loaded.bars[1].close, 1.13);
        assert!(loaded.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnparseableTimestamps { count: 1, first_row: 1 }
        )));
    }

    #[test]
    fn csv_missing_price_column_is_reported() {
        let file = write_csv("date,open,high,low\n2024-01-02,1.1,1.2,1.0\n");
        let loaded = CsvSource::new(file.path()).fetch().unwrap();
        assert!(loaded.bars[0].close.is_nan());
        assert!(loaded
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::MissingColumn { column } if column == "Close")));
    }

    #[test]
    fn csv_without_timestamp_column_fails() {
        let file = write_csv("open,high,low,close\n1.1,1.2,1.0,1.1\n");
        assert!(matches!(
            CsvSource::new(file.path()).fetch(),
            Err(LoadError::MissingTimestamp { .. })
        ));
    }

    #[test]
    fn csv_missing_file_fails() {
        let result = CsvSource::new("/definitely/not/here.csv").fetch();
        assert!(matches!(result, Err(LoadError::Csv { .. })));
    }

    fn synthetic(seed: u64) -> SyntheticSource {
        SyntheticSource {
            pair: "EUR/USD".parse().unwrap(),
            bars: 300,
            start: chrono::NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            interval: Duration::hours(1),
            seed,
        }
    }

    #[test]
    fn synthetic_is_deterministic_per_seed() {
        let a = synthetic(7).fetch().unwrap();
        let b = synthetic(7).fetch().unwrap();
        let c = synthetic(8).fetch().unwrap();
        assert_eq!(a.bars, b.bars);
        assert_ne!(a.bars, c.bars);
        assert!(a.synthetic);
    }

    #[test]
    fn synthetic_bars_are_sane_and_skip_weekends() {
        let loaded = synthetic(1).fetch().unwrap();
        assert_eq!(loaded.bars.len(), 300);
        for bar in &loaded.bars {
            assert!(bar.is_sane(), "{bar:?}");
            assert!(!matches!(bar.timestamp.weekday(), Weekday::Sat | Weekday::Sun));
        }
        assert!(loaded
            .bars
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn weekly_walk_from_a_saturday_moves_to_monday() {
        let mut source = synthetic(3);
        source.bars = 30;
        source.start = chrono::NaiveDate::from_ymd_opt(2024, 1, 6)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        source.interval = Duration::minutes(10_080);
        let loaded = source.fetch().unwrap();
        assert_eq!(loaded.bars.len(), 30);
        assert_eq!(
            loaded.bars[0].timestamp.format("%Y-%m-%d %H:%M").to_string(),
            "2024-01-08 09:30"
        );
        for pair in loaded.bars.windows(2) {
            assert_eq!(pair[0].timestamp.weekday(), Weekday::Mon);
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::weeks(1));
        }
    }

    #[test]
    fn jpy_pairs_start_near_150() {
        let mut source = synthetic(1);
        source.pair = "USD/JPY".parse().unwrap();
        let loaded = source.fetch().unwrap();
        assert!((loaded.bars[0].open - 150.0).abs() < 1e-9);
    }
}
