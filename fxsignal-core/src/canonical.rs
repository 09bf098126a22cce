//! Canonical ordering of a bar series: ascending, unique timestamps.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::domain::PriceBar;
use chrono::NaiveDateTime;

/// Sort bars by timestamp and drop repeated timestamps.
///
/// The sort is stable, so when several bars share a timestamp the one that
/// appeared first in the input is kept. Reordering and dropped duplicates
/// are reported in `diagnostics`.
pub fn canonicalize_bars(mut bars: Vec<PriceBar>, diagnostics: &mut Diagnostics) -> Vec<PriceBar> {
    if bars.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
        bars.sort_by_key(|b| b.timestamp);
        diagnostics.push(Diagnostic::Reordered);
    }

    let before = bars.len();
    let mut first_duplicate: Option<NaiveDateTime> = None;
    bars.dedup_by(|later, kept| {
        let duplicate = later.timestamp == kept.timestamp;
        if duplicate && first_duplicate.is_none() {
            first_duplicate = Some(later.timestamp);
        }
        duplicate
    });

    if let Some(first) = first_duplicate {
        diagnostics.push(Diagnostic::DuplicateTimestamps {
            count: before - bars.len(),
            first,
        });
    }
    bars
}

/// Index of the first bar whose timestamp does not strictly increase.
pub fn first_unordered(bars: &[PriceBar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
        .map(|i| i + 1)
}
