use crate::core::currency::{CurrencyPair, FxError};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much a quote can be trusted, best first.
///
/// The derived ordering runs from `Live` to `Unavailable`, so the worst
/// confidence of several legs is simply their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Live,
    Cached,
    Indicative,
    Unavailable,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Live => "live",
            Confidence::Cached => "cached",
            Confidence::Indicative => "indicative",
            Confidence::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Which side of a quote a conversion is priced at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Every leg at the mid.
    #[default]
    Indicative,
    /// Every leg at the bid of the pair as travelled, the edge of the
    /// spread that gives the sender less. Falls back to the mid when the
    /// quote has no bid.
    Conservative,
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Indicative => f.write_str("indicative"),
            PricingMode::Conservative => f.write_str("conservative"),
        }
    }
}

impl FromStr for PricingMode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indicative" | "mid" => Ok(PricingMode::Indicative),
            "conservative" => Ok(PricingMode::Conservative),
            other => Err(FxError::UnknownPricingMode(other.to_string())),
        }
    }
}

/// Midpoint of bid and ask. Falls back to whichever side is present,
/// and to zero when neither is.
pub fn calculate_mid(bid: Option<Decimal>, ask: Option<Decimal>) -> Decimal {
    match (bid, ask) {
        (Some(b), Some(a)) => (b + a) / Decimal::TWO,
        (Some(one), None) | (None, Some(one)) => one,
        (None, None) => Decimal::ZERO,
    }
}

/// Quoted bid/ask spread in whole basis points of `mid`.
///
/// Zero when either side is missing or `mid` is zero.
pub fn calculate_spread_bps(bid: Option<Decimal>, ask: Option<Decimal>, mid: Decimal) -> Decimal {
    match (bid, ask) {
        (Some(b), Some(a)) if !mid.is_zero() => ((a - b) / mid * Decimal::from(10_000))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        _ => Decimal::ZERO,
    }
}

/// `1 / rate`, keeping zero as zero.
pub fn invert_rate(rate: Decimal) -> Decimal {
    if rate.is_zero() {
        Decimal::ZERO
    } else {
        Decimal::ONE / rate
    }
}

/// A normalised market quote for one currency pair, as handed over by
/// whatever market-data collaborator sits in front of the engine.
///
/// Pricing reads `mid`, or the bid under [`PricingMode::Conservative`]. A
/// quote whose feed is down is still representable: it carries
/// `Confidence::Unavailable` and a zero mid, which the calculator rejects as
/// invalid input.
///
/// # Examples
///
/// ```
/// use remit_pricing::core::quote::{Confidence, MarketQuote};
/// use rust_decimal_macros::dec;
///
/// let quote = MarketQuote::from_bid_ask("USD/BRL".parse().unwrap(), dec!(5.18), dec!(5.20));
/// assert_eq!(quote.mid, dec!(5.19));
/// assert_eq!(quote.spread_bps, dec!(39));
/// assert_eq!(quote.confidence, Confidence::Live);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub pair: CurrencyPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<Decimal>,
    pub mid: Decimal,
    pub spread_bps: Decimal,
    pub confidence: Confidence,
    pub as_of: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl MarketQuote {
    /// Quote built from both sides of the book, stamped now.
    pub fn from_bid_ask(pair: CurrencyPair, bid: Decimal, ask: Decimal) -> Self {
        Self::from_sides(pair, Some(bid), Some(ask))
    }

    /// Quote built from whatever sides are known. No side at all yields an
    /// unavailable quote.
    pub fn from_sides(pair: CurrencyPair, bid: Option<Decimal>, ask: Option<Decimal>) -> Self {
        let mid = calculate_mid(bid, ask);
        let confidence = if mid.is_zero() {
            Confidence::Unavailable
        } else {
            Confidence::Live
        };
        Self {
            pair,
            bid,
            ask,
            mid,
            spread_bps: calculate_spread_bps(bid, ask, mid),
            confidence,
            as_of: Utc::now(),
            source: None,
        }
    }

    /// Reference-only quote without a book, e.g. a published fixing.
    pub fn indicative(pair: CurrencyPair, mid: Decimal) -> Self {
        Self {
            pair,
            bid: None,
            ask: None,
            mid,
            spread_bps: Decimal::ZERO,
            confidence: Confidence::Indicative,
            as_of: Utc::now(),
            source: None,
        }
    }

    /// Placeholder for a pair whose feed could not be reached.
    pub fn unavailable(pair: CurrencyPair) -> Self {
        Self {
            confidence: Confidence::Unavailable,
            ..Self::indicative(pair, Decimal::ZERO)
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.confidence != Confidence::Unavailable && self.mid > Decimal::ZERO
    }

    /// Rate a conversion along `pair` executes at under `mode`.
    pub fn execution_rate(&self, mode: PricingMode) -> Decimal {
        match (mode, self.bid) {
            (PricingMode::Conservative, Some(bid)) if bid > Decimal::ZERO => bid,
            _ => self.mid,
        }
    }

    /// How far `execution_rate` sits below the mid, in basis points.
    pub fn slippage_bps(&self, mode: PricingMode) -> Decimal {
        if self.mid.is_zero() {
            return Decimal::ZERO;
        }
        (self.mid - self.execution_rate(mode)) / self.mid * Decimal::from(10_000)
    }

    /// The same quote seen from the other side of the pair.
    ///
    /// Bid and ask swap roles: selling the quote currency back happens at
    /// `1 / ask`, buying it at `1 / bid`.
    pub fn inverted(&self) -> Self {
        let bid = self.ask.map(invert_rate);
        let ask = self.bid.map(invert_rate);
        let mid = invert_rate(self.mid);
        Self {
            pair: self.pair.inverse(),
            bid,
            ask,
            mid,
            spread_bps: calculate_spread_bps(bid, ask, mid),
            confidence: self.confidence,
            as_of: self.as_of,
            source: self.source.clone(),
        }
    }
}
