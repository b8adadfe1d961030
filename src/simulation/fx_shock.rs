//! FX shock scenarios.
//!
//! Moves every rate into the destination currency by a percentage and
//! re-runs the comparison, reporting the payout impact per provider.

use crate::core::currency::{CurrencyCode, CurrencyPair};
use crate::core::error::PricingError;
use crate::core::provider::ProviderId;
use crate::core::quote::MarketQuote;
use crate::core::rates::RateSource;
use crate::pricing::comparison::{ComparisonEngine, ComparisonOptions};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payout of one provider before and after a shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxShockResult {
    pub provider_id: ProviderId,
    /// Percentage move applied to rates quoted in the destination currency.
    /// Positive means the destination currency weakened.
    pub shock_pct: Decimal,
    pub baseline_final: Decimal,
    pub shocked_final: Decimal,
    pub impact: Decimal,
}

/// A [`RateSource`] view with every rate into `currency` scaled by `factor`.
pub struct ShockedRates<'a> {
    inner: &'a dyn RateSource,
    currency: CurrencyCode,
    factor: Decimal,
}

impl<'a> ShockedRates<'a> {
    pub fn new(
        inner: &'a dyn RateSource,
        currency: CurrencyCode,
        shock_pct: Decimal,
    ) -> Result<Self, PricingError> {
        let factor = Decimal::ONE + shock_pct / Decimal::ONE_HUNDRED;
        if factor <= Decimal::ZERO {
            return Err(PricingError::invalid(
                "shock_pct",
                shock_pct,
                "must be above -100",
            ));
        }
        Ok(Self {
            inner,
            currency,
            factor,
        })
    }

    fn scale(&self, mut quote: MarketQuote) -> MarketQuote {
        let factor = if quote.pair.quote == self.currency {
            self.factor
        } else if quote.pair.base == self.currency {
            Decimal::ONE / self.factor
        } else {
            return quote;
        };
        // Spread in bps is a ratio and survives the scaling unchanged.
        quote.bid = quote.bid.map(|v| v * factor);
        quote.ask = quote.ask.map(|v| v * factor);
        quote.mid *= factor;
        quote
    }
}

impl RateSource for ShockedRates<'_> {
    fn quote(&self, pair: &CurrencyPair) -> Option<MarketQuote> {
        self.inner.quote(pair).map(|q| self.scale(q))
    }

    fn as_of(&self) -> DateTime<Utc> {
        self.inner.as_of()
    }
}

/// Compare at `amount` under today's rates and under a `shock_pct` move of
/// the destination currency.
pub fn fx_shock(
    engine: &ComparisonEngine,
    amount: Decimal,
    shock_pct: Decimal,
    rates: &dyn RateSource,
    options: &ComparisonOptions,
) -> Result<Vec<FxShockResult>, PricingError> {
    let shocked = ShockedRates::new(rates, options.destination.clone(), shock_pct)?;
    let baseline = engine.compare(amount, rates, options)?;
    let stressed = engine.compare(amount, &shocked, options)?;

    baseline
        .models
        .iter()
        .map(|before| {
            let after = stressed
                .outcome(before.provider_id)
                .ok_or_else(|| PricingError::UnknownProvider(before.provider_id.to_string()))?;
            Ok(FxShockResult {
                provider_id: before.provider_id,
                shock_pct,
                baseline_final: before.breakdown.final_amount,
                shocked_final: after.breakdown.final_amount,
                impact: after.breakdown.final_amount - before.breakdown.final_amount,
            })
        })
        .collect()
}
