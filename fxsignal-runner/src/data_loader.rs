//! Bar loading for the runner.
//!
//! Pulls raw bars from a [`PriceSource`], then applies the steps every
//! source shares:
//! 1. Canonical order: stable sort by timestamp, first duplicate wins
//! 2. Inclusive calendar-day filter on `start`/`end`
//! 3. Optional resampling to a coarser interval
//!
//! The result carries a dataset hash so identical inputs can be recognised
//! across runs.

use crate::source::{LoadError, PriceSource};
use chrono::{Duration, NaiveDate};
use fxsignal_core::canonical::canonicalize_bars;
use fxsignal_core::diagnostics::Diagnostics;
use fxsignal_core::domain::PriceBar;
use fxsignal_core::resample::resample;

/// Options controlling how bars are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// First day kept (inclusive).
    pub start: Option<NaiveDate>,
    /// Last day kept (inclusive).
    pub end: Option<NaiveDate>,
    /// Resample to buckets of this width.
    pub resample: Option<Duration>,
}

/// Canonical bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<PriceBar>,
    pub diagnostics: Diagnostics,
    /// BLAKE3 over timestamps and OHLCV values.
    pub dataset_hash: String,
    pub synthetic: bool,
}

/// Load, canonicalise, filter and resample a series.
pub fn load_bars(source: &dyn PriceSource, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let loaded = source.fetch()?;
    if loaded.synthetic {
        tracing::warn!(source = %source.describe(), "using synthetic bars");
    }
    let mut diagnostics = loaded.diagnostics;
    let raw_len = loaded.bars.len();

    let mut bars = canonicalize_bars(loaded.bars, &mut diagnostics);
    bars.retain(|bar| {
        let day = bar.timestamp.date();
        opts.start.map_or(true, |start| day >= start) && opts.end.map_or(true, |end| day <= end)
    });
    if let Some(interval) = opts.resample {
        bars = resample(&bars, interval)?;
    }

    tracing::info!(
        source = %source.describe(),
        raw = raw_len,
        kept = bars.len(),
        "bars loaded"
    );

    let dataset_hash = compute_dataset_hash(&bars);
    Ok(LoadedData {
        bars,
        diagnostics,
        dataset_hash,
        synthetic: loaded.synthetic,
    })
}

/// Deterministic BLAKE3 hash over all bar data, in canonical order.
pub fn compute_dataset_hash(bars: &[PriceBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp_millis().to_le_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            // all NaN payloads hash alike
            let value = if value.is_nan() { f64::NAN } else { value };
            hasher.update(&value.to_bits().to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
