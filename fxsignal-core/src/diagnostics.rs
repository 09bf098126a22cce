//! Non-fatal conditions reported alongside a table build.
//!
//! Nothing in here aborts a run. Malformed input and per-bar scoring faults
//! are collected so the caller can inspect them, and each one is logged as
//! it is recorded.

use crate::domain::PriceField;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
}

/// A condition detected while loading, enriching or scoring a series.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("{count} malformed {field} value(s), first at row {first_row}")]
    MalformedInput {
        field: PriceField,
        count: usize,
        first_row: usize,
    },

    #[error("series of {bars} bar(s) is shorter than the {required}-bar window of {stage}")]
    InsufficientHistory {
        stage: String,
        bars: usize,
        required: usize,
    },

    #[error("{column} is undefined for the whole series")]
    IndicatorUndefined { column: String },

    #[error("scoring fault at bar {bar_index}: {reason}")]
    ScoringFault { bar_index: usize, reason: String },

    #[error("{count} duplicate timestamp(s) dropped, first at {first}")]
    DuplicateTimestamps { count: usize, first: NaiveDateTime },

    #[error("{count} row(s) with unparseable timestamps dropped, first at row {first_row}")]
    UnparseableTimestamps { count: usize, first_row: usize },

    #[error("input was not in timestamp order and has been sorted")]
    Reordered,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::InsufficientHistory { .. }
            | Diagnostic::IndicatorUndefined { .. }
            | Diagnostic::Reordered => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// Ordered collection of diagnostics for one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it through `tracing`.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => tracing::warn!(%diagnostic, "input diagnostic"),
            Severity::Info => tracing::info!(%diagnostic, "input diagnostic"),
        }
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    /// Number of per-bar scoring faults recorded.
    pub fn scoring_faults(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| matches!(d, Diagnostic::ScoringFault { .. }))
            .count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Scan the OHLC fields for values that are missing, non-finite or
/// non-positive and report one diagnostic per affected field.
pub fn scan_price_fields(bars: &[crate::domain::PriceBar], diagnostics: &mut Diagnostics) {
    for field in PriceField::PRICES {
        let mut bad = bars
            .iter()
            .enumerate()
            .filter(|(_, b)| !crate::domain::PriceBar::is_valid_price(b.field(field)))
            .map(|(i, _)| i);
        if let Some(first_row) = bad.next() {
            diagnostics.push(Diagnostic::MalformedInput {
                field,
                count: 1 + bad.count(),
                first_row,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn severity_split() {
        let info = Diagnostic::InsufficientHistory {
            stage: "scoring".into(),
            bars: 10,
            required: 21,
        };
        let warn = Diagnostic::ScoringFault {
            bar_index: 30,
            reason: "ATR undefined".into(),
        };
        assert_eq!(info.severity(), Severity::Info);
        assert_eq!(warn.severity(), Severity::Warning);
    }

    #[test]
    fn display_is_human_readable() {
        let d = Diagnostic::MalformedInput {
            field: PriceField::High,
            count: 2,
            first_row: 7,
        };
        assert_eq!(d.to_string(), "2 malformed High value(s), first at row 7");
    }

    #[test]
    fn scan_reports_each_bad_field_once() {
        let mut bars = make_bars(&[1.1, 1.2, 1.3, 1.4]);
        bars[1].high = f64::NAN;
        bars[3].high = -1.0;
        bars[2].close = f64::INFINITY;

        let mut diags = Diagnostics::new();
        scan_price_fields(&bars, &mut diags);

        let entries = diags.into_vec();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&Diagnostic::MalformedInput {
            field: PriceField::High,
            count: 2,
            first_row: 1,
        }));
        assert!(entries.contains(&Diagnostic::MalformedInput {
            field: PriceField::Close,
            count: 1,
            first_row: 2,
        }));
    }

    #[test]
    fn clean_bars_produce_nothing() {
        let mut diags = Diagnostics::new();
        scan_price_fields(&make_bars(&[1.1, 1.2]), &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn counts_scoring_faults() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::Reordered);
        diags.push(Diagnostic::ScoringFault {
            bar_index: 1,
            reason: "x".into(),
        });
        assert_eq!(diags.scoring_faults(), 1);
        assert_eq!(diags.warnings().count(), 1);
    }
}
