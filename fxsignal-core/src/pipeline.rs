//! Table build: indicators first, then breakouts, brackets and scoring.
//!
//! Every downstream stage reads the indicator columns computed in the
//! first pass; none of them recomputes or mutates another stage's output.

use crate::bracket::compute_brackets;
use crate::breakout::detect_breakouts;
use crate::canonical::first_unordered;
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::domain::PriceBar;
use crate::engine::{sanitize_bars, IndicatorEngine};
use crate::scoring::score_series;
use crate::table::{EnrichedTable, TableError};
use std::time::Instant;

/// Enrich an ordered bar series.
///
/// Fails only on an invalid config or timestamps that are not strictly
/// increasing. Malformed prices, short series and per-bar scoring faults are
/// recorded in the table's diagnostics instead.
pub fn build_enriched_table(
    bars: Vec<PriceBar>,
    config: &EngineConfig,
) -> Result<EnrichedTable, TableError> {
    build_with_diagnostics(bars, config, Diagnostics::new())
}

/// As [`build_enriched_table`], appending to diagnostics gathered while the
/// bars were loaded.
pub fn build_with_diagnostics(
    bars: Vec<PriceBar>,
    config: &EngineConfig,
    mut diagnostics: Diagnostics,
) -> Result<EnrichedTable, TableError> {
    config.validate()?;
    if let Some(index) = first_unordered(&bars) {
        return Err(TableError::Unordered { index });
    }

    let started = Instant::now();
    let engine = IndicatorEngine::from_config(&config.indicators);
    let indicators = engine.compute(&bars, &mut diagnostics);
    let bars = sanitize_bars(&bars).into_owned();
    tracing::debug!(
        elapsed_us = started.elapsed().as_micros() as u64,
        "indicator stage"
    );

    let breakouts = detect_breakouts(&bars, &indicators, config.breakout_window);
    let brackets = compute_brackets(&bars, &indicators, &config.bracket);
    let signals = score_series(
        &bars,
        &indicators,
        &config.scoring,
        config.parallel,
        &mut diagnostics,
    );

    tracing::debug!(
        bars = bars.len(),
        diagnostics = diagnostics.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "table built"
    );
    Ok(EnrichedTable::from_parts(
        bars,
        indicators,
        breakouts,
        brackets,
        signals,
        diagnostics,
    ))
}
