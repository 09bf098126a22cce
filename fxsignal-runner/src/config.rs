//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! pair = "EUR/USD"
//! start = "2024-01-01"
//! end = "2024-06-30"
//! resample_minutes = 45
//!
//! [source]
//! type = "csv"
//! path = "data/eurusd_h1.csv"
//!
//! [output]
//! path = "out/eurusd_enriched.parquet"
//! format = "parquet"
//!
//! [engine.scoring]
//! confidence_threshold = 0.8
//! ```

use crate::pair::CurrencyPair;
use chrono::{NaiveDate, NaiveDateTime};
use fxsignal_core::config::{ConfigError, EngineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Content hash identifying a run configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("engine config: {0}")]
    Engine(#[from] ConfigError),

    #[error("start {start} is after end {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("resample_minutes must be positive")]
    ZeroResample,

    #[error("synthetic source needs at least one bar")]
    EmptySynthetic,

    #[error("synthetic interval_minutes must be positive")]
    ZeroSyntheticInterval,

    #[error("failed to hash config: {0}")]
    Hash(#[from] serde_json::Error),
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Header-mapped CSV file.
    Csv { path: PathBuf },

    /// Parquet file with a timestamp column and OHLC columns.
    Parquet { path: PathBuf },

    /// Seeded random walk, for demos and tests.
    Synthetic {
        #[serde(default = "default_synthetic_bars")]
        bars: usize,
        #[serde(default = "default_synthetic_start")]
        start: NaiveDateTime,
        #[serde(default = "default_synthetic_minutes")]
        interval_minutes: u32,
        #[serde(default)]
        seed: u64,
    },
}

impl SourceConfig {
    /// Synthetic source of `bars` bars with default start, interval and seed.
    pub fn synthetic(bars: usize) -> Self {
        SourceConfig::Synthetic {
            bars,
            start: default_synthetic_start(),
            interval_minutes: default_synthetic_minutes(),
            seed: 0,
        }
    }
}

fn default_synthetic_bars() -> usize {
    1_000
}

fn default_synthetic_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn default_synthetic_minutes() -> u32 {
    60
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
            OutputFormat::Json => "jsonl",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (csv, parquet, json)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
}

/// Everything needed to reproduce one enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub pair: CurrencyPair,
    pub source: SourceConfig,
    /// First day kept (inclusive).
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last day kept (inclusive).
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Resample to buckets of this many minutes before enrichment.
    #[serde(default)]
    pub resample_minutes: Option<u32>,
    #[serde(default)]
    pub output: Option<OutputConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RunConfig {
    pub fn from_toml(content: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        self.engine.validate()?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(RunConfigError::DateRange { start, end });
            }
        }
        if self.resample_minutes == Some(0) {
            return Err(RunConfigError::ZeroResample);
        }
        if let SourceConfig::Synthetic {
            bars,
            interval_minutes,
            ..
        } = self.source
        {
            if bars == 0 {
                return Err(RunConfigError::EmptySynthetic);
            }
            if interval_minutes == 0 {
                return Err(RunConfigError::ZeroSyntheticInterval);
            }
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, RunConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
