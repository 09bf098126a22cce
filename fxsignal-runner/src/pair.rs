//! Currency pair label (`EUR/USD`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairError {
    #[error("'{0}' is not a currency pair (expected BASE/QUOTE, e.g. EUR/USD)")]
    Format(String),

    #[error("'{0}' is not a three-letter currency code")]
    Code(String),

    #[error("base and quote are both {0}")]
    SameCurrency(String),
}

/// A base/quote pair of ISO-style three-letter codes, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyPair {
    base: String,
    quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Result<Self, PairError> {
        let base = currency_code(base)?;
        let quote = currency_code(quote)?;
        if base == quote {
            return Err(PairError::SameCurrency(base));
        }
        Ok(Self { base, quote })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// `EURUSD` form used in file names.
    pub fn compact(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

fn currency_code(raw: &str) -> Result<String, PairError> {
    let code = raw.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(PairError::Code(raw.to_string()))
    }
}

impl FromStr for CurrencyPair {
    type Err = PairError;

    /// Accepts `EUR/USD`, `EUR_USD`, `EUR-USD` and `EURUSD`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((base, quote)) = s.split_once(['/', '_', '-']) {
            return Self::new(base, quote);
        }
        if s.len() == 6 && s.is_ascii() {
            return Self::new(&s[..3], &s[3..]);
        }
        Err(PairError::Format(s.to_string()))
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl TryFrom<String> for CurrencyPair {
    type Error = PairError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CurrencyPair> for String {
    fn from(p: CurrencyPair) -> String {
        p.to_string()
    }
}
