//! Table schema contract: column names, types and order of the enriched table.
//!
//! Every stage appends its own columns under the names below. Sinks and
//! downstream collaborators rely on these names verbatim.

use serde::{Deserialize, Serialize};

/// Column names of the enriched table.
pub mod columns {
    pub const TIMESTAMP: &str = "timestamp";
    pub const OPEN: &str = "Open";
    pub const HIGH: &str = "High";
    pub const LOW: &str = "Low";
    pub const CLOSE: &str = "Close";
    pub const VOLUME: &str = "Volume";

    pub const SMA_20: &str = "SMA_20";
    pub const EMA_20: &str = "EMA_20";
    pub const RSI: &str = "RSI";
    pub const MACD: &str = "MACD";
    pub const MACD_SIGNAL: &str = "MACD_Signal";
    pub const MACD_HIST: &str = "MACD_Hist";
    pub const ATR: &str = "ATR";
    pub const BOLLINGER_UPPER: &str = "Bollinger_Upper";
    pub const BOLLINGER_MIDDLE: &str = "Bollinger_Middle";
    pub const BOLLINGER_LOWER: &str = "Bollinger_Lower";
    pub const WEEKLY_VWAP: &str = "Weekly_VWAP";
    pub const RESISTANCE: &str = "Resistance";
    pub const SUPPORT: &str = "Support";
    pub const RETURNS: &str = "Returns";
    pub const LOG_RETURNS: &str = "Log_Returns";

    pub const BREAKOUT: &str = "Breakout";

    pub const TP_LONG: &str = "TP_Long";
    pub const SL_LONG: &str = "SL_Long";
    pub const TP_SHORT: &str = "TP_Short";
    pub const SL_SHORT: &str = "SL_Short";

    pub const SIGNAL: &str = "Signal";
    pub const CONFIDENCE: &str = "Confidence";
    pub const ENTRY_PRICE: &str = "Entry_Price";
    pub const TAKE_PROFIT: &str = "Take_Profit";
    pub const STOP_LOSS: &str = "Stop_Loss";
}

/// Indicator columns in output order.
pub const INDICATOR_COLUMNS: [&str; 15] = [
    columns::SMA_20,
    columns::EMA_20,
    columns::RSI,
    columns::MACD,
    columns::MACD_SIGNAL,
    columns::MACD_HIST,
    columns::ATR,
    columns::BOLLINGER_UPPER,
    columns::BOLLINGER_MIDDLE,
    columns::BOLLINGER_LOWER,
    columns::WEEKLY_VWAP,
    columns::RESISTANCE,
    columns::SUPPORT,
    columns::RETURNS,
    columns::LOG_RETURNS,
];

/// Expected data types in the enriched table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaType {
    Datetime,
    Float64,
    Int8,
}

/// A single field in the expected schema.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaField {
    pub name: &'static str,
    pub dtype: SchemaType,
}

const fn float(name: &'static str) -> SchemaField {
    SchemaField {
        name,
        dtype: SchemaType::Float64,
    }
}

/// Raw price columns every input frame must provide.
///
/// - Sort order: ascending by timestamp, timestamps unique
/// - Missing prices: strict NaN / null (no forward-fill)
/// - Volume is optional and defaults to 0.0
pub const PRICE_SCHEMA: &[SchemaField] = &[
    SchemaField {
        name: columns::TIMESTAMP,
        dtype: SchemaType::Datetime,
    },
    float(columns::OPEN),
    float(columns::HIGH),
    float(columns::LOW),
    float(columns::CLOSE),
];

/// Full enriched table contract, in column order.
pub const ENRICHED_SCHEMA: &[SchemaField] = &[
    SchemaField {
        name: columns::TIMESTAMP,
        dtype: SchemaType::Datetime,
    },
    float(columns::OPEN),
    float(columns::HIGH),
    float(columns::LOW),
    float(columns::CLOSE),
    float(columns::VOLUME),
    float(columns::SMA_20),
    float(columns::EMA_20),
    float(columns::RSI),
    float(columns::MACD),
    float(columns::MACD_SIGNAL),
    float(columns::MACD_HIST),
    float(columns::ATR),
    float(columns::BOLLINGER_UPPER),
    float(columns::BOLLINGER_MIDDLE),
    float(columns::BOLLINGER_LOWER),
    float(columns::WEEKLY_VWAP),
    float(columns::RESISTANCE),
    float(columns::SUPPORT),
    float(columns::RETURNS),
    float(columns::LOG_RETURNS),
    SchemaField {
        name: columns::BREAKOUT,
        dtype: SchemaType::Int8,
    },
    float(columns::TP_LONG),
    float(columns::SL_LONG),
    float(columns::TP_SHORT),
    float(columns::SL_SHORT),
    SchemaField {
        name: columns::SIGNAL,
        dtype: SchemaType::Int8,
    },
    float(columns::CONFIDENCE),
    float(columns::ENTRY_PRICE),
    float(columns::TAKE_PROFIT),
    float(columns::STOP_LOSS),
];

/// Result of schema validation.
#[derive(Debug, Clone)]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Validate (column_name, column_type) pairs against a contract.
///
/// Columns outside the contract are allowed; callers ignore them.
pub fn validate_schema(contract: &[SchemaField], columns: &[(&str, SchemaType)]) -> SchemaValidation {
    let mut errors = Vec::new();

    for expected in contract {
        match columns.iter().find(|(name, _)| *name == expected.name) {
            Some((_, dtype)) if *dtype == expected.dtype => {}
            Some((_, dtype)) => {
                errors.push(format!(
                    "column '{}': expected {:?}, got {:?}",
                    expected.name, expected.dtype, dtype
                ));
            }
            None => {
                errors.push(format!("missing required column '{}'", expected.name));
            }
        }
    }

    SchemaValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
