//! EnrichedTable: the bar series with every derived column attached.
//!
//! Column names and order follow [`crate::schema::ENRICHED_SCHEMA`].
//! Undefined values are NaN in memory and null once exported to a polars
//! `DataFrame`.

use crate::components::indicator::IndicatorValues;
use crate::config::{ConfigError, EngineConfig};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::domain::{
    parse_timestamp, BracketLevels, BreakoutFlag, PriceBar, PriceField, SignalDirection,
    SignalRecord,
};
use crate::engine::IndicatorSet;
use crate::schema::{
    columns, validate_schema, SchemaField, SchemaType, SchemaValidation, INDICATOR_COLUMNS,
};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("polars: {0}")]
    Polars(#[from] PolarsError),

    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("no timestamp column (expected 'timestamp' or 'date')")]
    MissingTimestamp,

    #[error("timestamp column has unsupported type {0}")]
    TimestampType(String),

    #[error("timestamps must be strictly increasing; bar {index} is not")]
    Unordered { index: usize },
}

/// Bars plus indicator, breakout, bracket and signal columns, row-aligned.
#[derive(Debug, Clone)]
pub struct EnrichedTable {
    bars: Vec<PriceBar>,
    indicators: IndicatorValues,
    breakouts: Vec<BreakoutFlag>,
    brackets: Vec<BracketLevels>,
    signals: Vec<SignalRecord>,
    diagnostics: Diagnostics,
}

/// One row of the table, keyed by output column name when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Open")]
    pub open: Option<f64>,
    #[serde(rename = "High")]
    pub high: Option<f64>,
    #[serde(rename = "Low")]
    pub low: Option<f64>,
    #[serde(rename = "Close")]
    pub close: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: Option<f64>,
    #[serde(flatten)]
    pub indicators: IndicatorSet,
    #[serde(rename = "Breakout")]
    pub breakout: BreakoutFlag,
    #[serde(rename = "TP_Long")]
    pub tp_long: Option<f64>,
    #[serde(rename = "SL_Long")]
    pub sl_long: Option<f64>,
    #[serde(rename = "TP_Short")]
    pub tp_short: Option<f64>,
    #[serde(rename = "SL_Short")]
    pub sl_short: Option<f64>,
    #[serde(rename = "Signal")]
    pub signal: SignalDirection,
    #[serde(rename = "Confidence")]
    pub confidence: f64,
    #[serde(rename = "Entry_Price")]
    pub entry_price: Option<f64>,
    #[serde(rename = "Take_Profit")]
    pub take_profit: Option<f64>,
    #[serde(rename = "Stop_Loss")]
    pub stop_loss: Option<f64>,
}

/// Counts and the most recent emitted signals of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub bars: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub bullish_breakouts: usize,
    pub bearish_breakouts: usize,
    pub warnings: usize,
    pub recent_signals: Vec<EnrichedRow>,
}

fn defined(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

impl EnrichedTable {
    pub(crate) fn from_parts(
        bars: Vec<PriceBar>,
        indicators: IndicatorValues,
        breakouts: Vec<BreakoutFlag>,
        brackets: Vec<BracketLevels>,
        signals: Vec<SignalRecord>,
        diagnostics: Diagnostics,
    ) -> Self {
        debug_assert_eq!(breakouts.len(), bars.len());
        debug_assert_eq!(brackets.len(), bars.len());
        debug_assert_eq!(signals.len(), bars.len());
        Self {
            bars,
            indicators,
            breakouts,
            brackets,
            signals,
            diagnostics,
        }
    }

    /// Build a table from a polars frame produced by any upstream source.
    ///
    /// Column names are matched case-insensitively. The timestamp column may
    /// be named `timestamp` or `date` and hold datetimes, dates or strings.
    /// Rows whose timestamp cannot be read are dropped. A missing or
    /// non-numeric price column is reported and carried as undefined. The
    /// rows are then put into canonical order before enrichment.
    pub fn from_dataframe(df: &DataFrame, config: &EngineConfig) -> Result<Self, TableError> {
        let mut diagnostics = Diagnostics::new();
        let bars = bars_from_dataframe(df, &mut diagnostics)?;
        let bars = crate::canonical::canonicalize_bars(bars, &mut diagnostics);
        crate::pipeline::build_with_diagnostics(bars, config, diagnostics)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn indicators(&self) -> &IndicatorValues {
        &self.indicators
    }

    pub fn breakouts(&self) -> &[BreakoutFlag] {
        &self.breakouts
    }

    pub fn brackets(&self) -> &[BracketLevels] {
        &self.brackets
    }

    pub fn signals(&self) -> &[SignalRecord] {
        &self.signals
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn row(&self, i: usize) -> Option<EnrichedRow> {
        let bar = self.bars.get(i)?;
        let brackets = self.brackets[i];
        let signal = self.signals[i];
        Some(EnrichedRow {
            timestamp: bar.timestamp,
            open: defined(bar.open),
            high: defined(bar.high),
            low: defined(bar.low),
            close: defined(bar.close),
            volume: defined(bar.volume),
            indicators: IndicatorSet::at(&self.indicators, i),
            breakout: self.breakouts[i],
            tp_long: defined(brackets.tp_long),
            sl_long: defined(brackets.sl_long),
            tp_short: defined(brackets.tp_short),
            sl_short: defined(brackets.sl_short),
            signal: signal.signal,
            confidence: signal.confidence,
            entry_price: defined(signal.entry_price),
            take_profit: defined(signal.take_profit),
            stop_loss: defined(signal.stop_loss),
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = EnrichedRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    /// Export every column as a polars frame in schema order.
    pub fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let n = self.len();
        let timestamps: Vec<i64> = self
            .bars
            .iter()
            .map(|b| b.timestamp.and_utc().timestamp_millis())
            .collect();

        let mut cols: Vec<Column> = Vec::with_capacity(crate::schema::ENRICHED_SCHEMA.len());
        cols.push(
            Column::new(columns::TIMESTAMP.into(), timestamps)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        );
        for field in [
            PriceField::Open,
            PriceField::High,
            PriceField::Low,
            PriceField::Close,
            PriceField::Volume,
        ] {
            cols.push(float_column(
                field.column(),
                self.bars.iter().map(|b| b.field(field)),
            ));
        }

        for name in INDICATOR_COLUMNS {
            match self.indicators.get_series(name) {
                Some(series) if series.len() == n => {
                    cols.push(float_column(name, series.iter().copied()))
                }
                _ => cols.push(float_column(name, std::iter::repeat(f64::NAN).take(n))),
            }
        }

        let breakouts: Vec<i8> = self.breakouts.iter().map(|b| b.as_i8()).collect();
        cols.push(Column::new(columns::BREAKOUT.into(), breakouts));
        cols.push(float_column(columns::TP_LONG, self.brackets.iter().map(|b| b.tp_long)));
        cols.push(float_column(columns::SL_LONG, self.brackets.iter().map(|b| b.sl_long)));
        cols.push(float_column(columns::TP_SHORT, self.brackets.iter().map(|b| b.tp_short)));
        cols.push(float_column(columns::SL_SHORT, self.brackets.iter().map(|b| b.sl_short)));

        let signals: Vec<i8> = self.signals.iter().map(|s| s.signal.as_i8()).collect();
        cols.push(Column::new(columns::SIGNAL.into(), signals));
        cols.push(float_column(columns::CONFIDENCE, self.signals.iter().map(|s| s.confidence)));
        cols.push(float_column(columns::ENTRY_PRICE, self.signals.iter().map(|s| s.entry_price)));
        cols.push(float_column(columns::TAKE_PROFIT, self.signals.iter().map(|s| s.take_profit)));
        cols.push(float_column(columns::STOP_LOSS, self.signals.iter().map(|s| s.stop_loss)));

        Ok(DataFrame::new(cols)?)
    }

    /// Summary over the whole table with the last `recent` emitted signals.
    pub fn summary(&self, recent: usize) -> TableSummary {
        let count_signal = |d: SignalDirection| self.signals.iter().filter(|s| s.signal == d).count();
        let count_flag = |f: BreakoutFlag| self.breakouts.iter().filter(|b| **b == f).count();

        let mut recent_signals: Vec<EnrichedRow> = (0..self.len())
            .rev()
            .filter(|&i| !self.signals[i].signal.is_neutral())
            .take(recent)
            .filter_map(|i| self.row(i))
            .collect();
        recent_signals.reverse();

        TableSummary {
            bars: self.len(),
            first: self.bars.first().map(|b| b.timestamp),
            last: self.bars.last().map(|b| b.timestamp),
            buy_signals: count_signal(SignalDirection::Buy),
            sell_signals: count_signal(SignalDirection::Sell),
            bullish_breakouts: count_flag(BreakoutFlag::Bullish),
            bearish_breakouts: count_flag(BreakoutFlag::Bearish),
            warnings: self.diagnostics.warnings().count(),
            recent_signals,
        }
    }

    /// BLAKE3 hex digest over bars and every derived column.
    ///
    /// Two builds of the same input under the same config hash identically;
    /// NaN payloads are normalised so any undefined value hashes the same.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut put = |v: f64| {
            let bits = if v.is_nan() { f64::NAN.to_bits() } else { v.to_bits() };
            hasher.update(&bits.to_le_bytes());
        };
        for bar in &self.bars {
            put(bar.timestamp.and_utc().timestamp_millis() as f64);
            for field in PriceField::PRICES {
                put(bar.field(field));
            }
            put(bar.volume);
        }
        for b in &self.brackets {
            put(b.tp_long);
            put(b.sl_long);
            put(b.tp_short);
            put(b.sl_short);
        }
        for s in &self.signals {
            put(f64::from(s.signal.as_i8()));
            put(s.confidence);
            put(s.entry_price);
            put(s.take_profit);
            put(s.stop_loss);
        }
        for b in &self.breakouts {
            put(f64::from(b.as_i8()));
        }
        hasher.update(self.indicators.fingerprint().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Check a frame's column names and types against a schema contract.
///
/// Columns of a type outside the contract vocabulary count as missing.
pub fn validate_frame(df: &DataFrame, contract: &[SchemaField]) -> SchemaValidation {
    let typed: Vec<(&str, SchemaType)> = df
        .get_columns()
        .iter()
        .filter_map(|c| {
            let dtype = match c.dtype() {
                DataType::Datetime(_, _) => SchemaType::Datetime,
                DataType::Float64 => SchemaType::Float64,
                DataType::Int8 => SchemaType::Int8,
                _ => return None,
            };
            Some((c.name().as_str(), dtype))
        })
        .collect();
    validate_schema(contract, &typed)
}

fn float_column(name: &str, values: impl Iterator<Item = f64>) -> Column {
    let values: Vec<Option<f64>> = values.map(defined).collect();
    Column::new(name.into(), values)
}

// ── DataFrame ingestion ─────────────────────────────────────────────

fn find_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Column> {
    df.get_columns()
        .iter()
        .find(|c| c.name().as_str().eq_ignore_ascii_case(name))
}

/// Read bars out of a frame, NaN for unreadable prices.
///
/// Rows with an unreadable timestamp are dropped and reported. Order is
/// preserved; callers canonicalize afterwards.
pub fn bars_from_dataframe(
    df: &DataFrame,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<PriceBar>, TableError> {
    let ts_col = find_column(df, columns::TIMESTAMP)
        .or_else(|| find_column(df, "date"))
        .ok_or(TableError::MissingTimestamp)?;
    let timestamps = timestamp_values(ts_col)?;
    let n = timestamps.len();

    let mut price = |field: PriceField| -> Result<Vec<f64>, TableError> {
        match find_column(df, field.column()) {
            Some(col) => float_values(col),
            None if field == PriceField::Volume => Ok(vec![0.0; n]),
            None => {
                diagnostics.push(Diagnostic::MissingColumn {
                    column: field.column().to_string(),
                });
                Ok(vec![f64::NAN; n])
            }
        }
    };
    let open = price(PriceField::Open)?;
    let high = price(PriceField::High)?;
    let low = price(PriceField::Low)?;
    let close = price(PriceField::Close)?;
    let volume = price(PriceField::Volume)?;

    let mut bars = Vec::with_capacity(n);
    let mut unparseable = 0usize;
    let mut first_bad_row = None;
    for (i, ts) in timestamps.into_iter().enumerate() {
        match ts {
            Some(ts) => bars.push(
                PriceBar::new(ts, open[i], high[i], low[i], close[i])
                    .with_volume(if volume[i].is_nan() { 0.0 } else { volume[i] }),
            ),
            None => {
                unparseable += 1;
                first_bad_row.get_or_insert(i);
            }
        }
    }
    if let Some(first_row) = first_bad_row {
        diagnostics.push(Diagnostic::UnparseableTimestamps {
            count: unparseable,
            first_row,
        });
    }
    Ok(bars)
}

fn float_values(col: &Column) -> Result<Vec<f64>, TableError> {
    let cast = col.cast(&DataType::Float64)?;
    let ca = cast.f64()?;
    Ok(ca.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn timestamp_values(col: &Column) -> Result<Vec<Option<NaiveDateTime>>, TableError> {
    match col.dtype() {
        DataType::Datetime(_, _) | DataType::Date => {
            let millis = col
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            let ca = millis.i64()?;
            Ok(ca
                .iter()
                .map(|v| {
                    v.and_then(chrono::DateTime::from_timestamp_millis)
                        .map(|d| d.naive_utc())
                })
                .collect())
        }
        DataType::String => {
            let ca = col.str()?;
            Ok(ca.iter().map(|v| v.and_then(parse_timestamp)).collect())
        }
        other => Err(TableError::TimestampType(other.to_string())),
    }
}
