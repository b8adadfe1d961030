use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// Fiat codes (GBP, USD, BRL) and settlement tokens (USDT) share the
/// same representation. Codes are normalised to upper case.
///
/// # Examples
///
/// ```
/// use remit_pricing::core::currency::CurrencyCode;
///
/// let gbp = CurrencyCode::new("gbp");
/// assert_eq!(gbp.as_str(), "GBP");
/// assert_ne!(gbp, CurrencyCode::usd());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_uppercase())
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn usdt() -> Self {
        Self::new("USDT")
    }

    pub fn brl() -> Self {
        Self::new("BRL")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors arising from FX rate lookups and quote handling.
#[derive(Debug, Error)]
pub enum FxError {
    #[error("no FX rate available for {from} -> {to}")]
    RateNotFound {
        from: CurrencyCode,
        to: CurrencyCode,
    },
    #[error("FX rate must not be negative, got {rate} for {from} -> {to}")]
    InvalidRate {
        from: CurrencyCode,
        to: CurrencyCode,
        rate: Decimal,
    },
    #[error("invalid currency pair '{0}', expected BASE/QUOTE")]
    InvalidPair(String),
    #[error("settlement path needs at least two currencies, got {0}")]
    PathTooShort(usize),
    #[error("unknown pricing mode '{0}', expected indicative or conservative")]
    UnknownPricingMode(String),
    #[error("composed rate overflows along {from} -> {to}")]
    RateOverflow {
        from: CurrencyCode,
        to: CurrencyCode,
    },
}

/// A pair of currencies representing an exchange rate direction:
/// one unit of `base` buys `rate` units of `quote`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyPair {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Self {
        Self { base, quote }
    }

    /// The opposite direction of this pair.
    pub fn inverse(&self) -> Self {
        Self::new(self.quote.clone(), self.base.clone())
    }

    pub fn is_identity(&self) -> bool {
        self.base == self.quote
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = FxError;

    /// Accepts `GBP/USD` or `GBP-USD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('/')
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| FxError::InvalidPair(s.to_string()))?;
        if base.trim().is_empty() || quote.trim().is_empty() {
            return Err(FxError::InvalidPair(s.to_string()));
        }
        Ok(Self::new(CurrencyCode::new(base), CurrencyCode::new(quote)))
    }
}

impl TryFrom<String> for CurrencyPair {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyPair> for String {
    fn from(pair: CurrencyPair) -> Self {
        pair.to_string()
    }
}
