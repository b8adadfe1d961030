use crate::core::currency::{CurrencyCode, CurrencyPair, FxError};
use crate::core::quote::{Confidence, MarketQuote, PricingMode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Anything that can hand the engine an already-resolved quote.
///
/// Fetching, caching and freshness belong to the implementor; the pricing
/// code never sees a network or a clock, only what this returns.
pub trait RateSource {
    /// Quote for `pair`, or `None` when the source knows nothing about it.
    fn quote(&self, pair: &CurrencyPair) -> Option<MarketQuote>;

    /// Point in time the source's data reflects.
    fn as_of(&self) -> DateTime<Utc>;
}

/// Immutable snapshot of market quotes.
///
/// Stores each quote together with its inverse, so a table fed with
/// `USD/BRL` also answers `BRL/USD`. Identity pairs always resolve to 1.
///
/// # Examples
///
/// ```
/// use remit_pricing::core::quote::MarketQuote;
/// use remit_pricing::core::rates::{FxRateTable, RateSource};
/// use rust_decimal_macros::dec;
///
/// let mut table = FxRateTable::new();
/// table.insert(MarketQuote::indicative("USD/BRL".parse().unwrap(), dec!(5)));
///
/// let inverse = table.quote(&"BRL/USD".parse().unwrap()).unwrap();
/// assert_eq!(inverse.mid, dec!(0.2));
/// ```
#[derive(Debug, Clone)]
pub struct FxRateTable {
    as_of: DateTime<Utc>,
    quotes: HashMap<CurrencyPair, MarketQuote>,
}

impl Default for FxRateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FxRateTable {
    pub fn new() -> Self {
        Self {
            as_of: Utc::now(),
            quotes: HashMap::new(),
        }
    }

    /// Pin the snapshot time, e.g. to the fetch time reported upstream.
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }

    /// Insert a quote and its inverse, replacing earlier ones.
    ///
    /// Unavailable quotes are kept as-is: a zero mid is the caller's signal
    /// that the feed is down and must reach the calculator as such.
    pub fn insert(&mut self, quote: MarketQuote) {
        let inverse = quote.inverted();
        self.quotes.insert(inverse.pair.clone(), inverse);
        self.quotes.insert(quote.pair.clone(), quote);
    }

    /// Convenience for tests and CLI flags: an indicative mid-only quote.
    pub fn set_mid(&mut self, base: CurrencyCode, quote: CurrencyCode, mid: Decimal) -> Result<(), FxError> {
        if mid < Decimal::ZERO {
            return Err(FxError::InvalidRate {
                from: base,
                to: quote,
                rate: mid,
            });
        }
        let pair = CurrencyPair::new(base, quote);
        self.insert(MarketQuote::indicative(pair, mid).with_as_of(self.as_of));
        Ok(())
    }

    /// Mid rate for `from -> to`.
    pub fn mid(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Decimal, FxError> {
        let pair = CurrencyPair::new(from.clone(), to.clone());
        self.quote(&pair)
            .map(|q| q.mid)
            .ok_or_else(|| FxError::RateNotFound {
                from: from.clone(),
                to: to.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl RateSource for FxRateTable {
    fn quote(&self, pair: &CurrencyPair) -> Option<MarketQuote> {
        if pair.is_identity() {
            return Some(
                MarketQuote::indicative(pair.clone(), Decimal::ONE)
                    .with_confidence(Confidence::Live)
                    .with_as_of(self.as_of),
            );
        }
        self.quotes.get(pair).cloned()
    }

    fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }
}

impl FromIterator<MarketQuote> for FxRateTable {
    fn from_iter<T: IntoIterator<Item = MarketQuote>>(iter: T) -> Self {
        let mut table = Self::new();
        for quote in iter {
            table.insert(quote);
        }
        table
    }
}

/// One conversion step of a settlement route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Rate this leg executes at.
    pub rate: Decimal,
    pub mid: Decimal,
    /// Distance of `rate` below `mid`; zero when priced at the mid.
    pub slippage_bps: Decimal,
    pub spread_bps: Decimal,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Effective rate across a multi-leg settlement path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub pricing_mode: PricingMode,
    /// Product of the leg execution rates.
    pub effective_rate: Decimal,
    /// Product of the leg mids.
    pub mid_rate: Decimal,
    pub legs: Vec<RouteLeg>,
    /// Sum of the quoted spreads of every leg.
    pub total_spread_bps: Decimal,
    /// Distance of `effective_rate` below `mid_rate`.
    pub slippage_bps: Decimal,
    /// Worst confidence among the legs.
    pub confidence: Confidence,
    /// Timestamp of the stalest leg.
    pub as_of: DateTime<Utc>,
}

impl RouteQuote {
    /// Compose a route along `path` at the mid, e.g. `[GBP, USDT, BRL]`.
    ///
    /// Repeated adjacent currencies are skipped, so `[BRL, BRL]` is a valid
    /// identity route. Any missing leg fails the whole route; an unavailable
    /// leg does not, it shows up as a zero rate and `Unavailable` confidence.
    pub fn compose(source: &dyn RateSource, path: &[CurrencyCode]) -> Result<Self, FxError> {
        Self::compose_with_mode(source, path, PricingMode::Indicative)
    }

    /// Compose a route pricing every leg under `mode`.
    pub fn compose_with_mode(
        source: &dyn RateSource,
        path: &[CurrencyCode],
        mode: PricingMode,
    ) -> Result<Self, FxError> {
        if path.len() < 2 {
            return Err(FxError::PathTooShort(path.len()));
        }

        let mut legs = Vec::with_capacity(path.len() - 1);
        for window in path.windows(2) {
            let (from, to) = (&window[0], &window[1]);
            if from == to {
                continue;
            }
            let pair = CurrencyPair::new(from.clone(), to.clone());
            let quote = source.quote(&pair).ok_or_else(|| FxError::RateNotFound {
                from: from.clone(),
                to: to.clone(),
            })?;
            legs.push((quote, pair));
        }

        let from = path[0].clone();
        let to = path[path.len() - 1].clone();
        let overflow = || FxError::RateOverflow {
            from: from.clone(),
            to: to.clone(),
        };
        let mut effective_rate = Decimal::ONE;
        let mut mid_rate = Decimal::ONE;
        let mut total_spread_bps = Decimal::ZERO;
        let mut confidence = Confidence::Live;
        let mut as_of = source.as_of();
        let mut route_legs = Vec::with_capacity(legs.len());

        for (quote, pair) in legs {
            let rate = quote.execution_rate(mode);
            effective_rate = effective_rate.checked_mul(rate).ok_or_else(overflow)?;
            mid_rate = mid_rate.checked_mul(quote.mid).ok_or_else(overflow)?;
            total_spread_bps += quote.spread_bps;
            confidence = confidence.max(quote.confidence);
            as_of = as_of.min(quote.as_of);
            route_legs.push(RouteLeg {
                from: pair.base,
                to: pair.quote,
                rate,
                mid: quote.mid,
                slippage_bps: quote.slippage_bps(mode),
                spread_bps: quote.spread_bps,
                confidence: quote.confidence,
                source: quote.source,
            });
        }

        let slippage_bps = if mid_rate.is_zero() {
            Decimal::ZERO
        } else {
            (mid_rate - effective_rate) / mid_rate * Decimal::from(10_000)
        };

        Ok(Self {
            from,
            to,
            pricing_mode: mode,
            effective_rate,
            mid_rate,
            legs: route_legs,
            total_spread_bps,
            slippage_bps,
            confidence,
            as_of,
        })
    }

    /// `1 / effective_rate` for display, zero when the route is dead.
    pub fn inverted_rate(&self) -> Decimal {
        crate::core::quote::invert_rate(self.effective_rate)
    }
}
