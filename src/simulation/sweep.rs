//! Amount sweeps over the comparison engine.
//!
//! Fixed fees make the ranking depend on the send amount: a flat fee hurts
//! small transfers, a wide spread hurts large ones. Sweeping the amount
//! shows where the ranking flips.

use crate::core::error::PricingError;
use crate::core::provider::ProviderId;
use crate::core::rates::RateSource;
use crate::pricing::comparison::{ComparisonEngine, ComparisonOptions};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound on the amounts a single sweep visits.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Bisection halvings before `find_break_even` settles for the bracket it has.
const MAX_BISECTION_STEPS: usize = 128;

/// Range of send amounts to sweep, inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub from: Decimal,
    pub to: Decimal,
    pub step: Decimal,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            from: Decimal::from(1_000),
            to: Decimal::from(100_000),
            step: Decimal::from(9_900),
        }
    }
}

impl SweepConfig {
    /// The amounts visited, `from` first. `to` is always included.
    ///
    /// Fails when the range would yield more than [`MAX_SWEEP_POINTS`].
    pub fn amounts(&self) -> Result<Vec<Decimal>, PricingError> {
        if self.step <= Decimal::ZERO {
            return Err(PricingError::invalid("step", self.step, "must be positive"));
        }
        if self.from < Decimal::ZERO {
            return Err(PricingError::invalid("from", self.from, "must not be negative"));
        }
        if self.to < self.from {
            return Err(PricingError::invalid("to", self.to, "must not be below from"));
        }
        let steps = (self.to - self.from).checked_div(self.step);
        let max_steps = Decimal::from(MAX_SWEEP_POINTS - 1);
        if !steps.is_some_and(|n| n <= max_steps) {
            return Err(PricingError::invalid("step", self.step, "too many sweep points"));
        }
        let mut amounts = Vec::new();
        let mut current = self.from;
        while current < self.to {
            amounts.push(current);
            match current.checked_add(self.step) {
                Some(next) => current = next,
                None => break,
            }
        }
        amounts.push(self.to);
        Ok(amounts)
    }
}

/// Comparison summary at one amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub amount: Decimal,
    pub best_provider_id: ProviderId,
    pub final_amounts: BTreeMap<ProviderId, Decimal>,
}

/// Run a comparison at every amount of `config`.
pub fn sweep_amounts(
    engine: &ComparisonEngine,
    config: &SweepConfig,
    rates: &dyn RateSource,
    options: &ComparisonOptions,
) -> Result<Vec<SweepPoint>, PricingError> {
    config
        .amounts()?
        .into_iter()
        .map(|amount| {
            let result = engine.compare(amount, rates, options)?;
            Ok(SweepPoint {
                amount,
                best_provider_id: result.best_provider_id,
                final_amounts: result
                    .models
                    .iter()
                    .map(|m| (m.provider_id, m.breakdown.final_amount))
                    .collect(),
            })
        })
        .collect()
}

/// Smallest amount in `[low, high]` at which `challenger` pays out at least
/// as much as `incumbent`, located to within `tolerance`.
///
/// Every cost is linear in the amount plus a constant, so the payout gap
/// crosses zero at most once and bisection is exact up to `tolerance`.
/// Returns `None` when `challenger` trails over the whole range. `low` must
/// be positive: at zero every payout is zero and the providers always tie.
/// The search also stops once halving no longer moves the bracket, so a
/// tolerance finer than Decimal's precision still terminates.
#[allow(clippy::too_many_arguments)]
pub fn find_break_even(
    engine: &ComparisonEngine,
    challenger: ProviderId,
    incumbent: ProviderId,
    low: Decimal,
    high: Decimal,
    tolerance: Decimal,
    rates: &dyn RateSource,
    options: &ComparisonOptions,
) -> Result<Option<Decimal>, PricingError> {
    if tolerance <= Decimal::ZERO {
        return Err(PricingError::invalid("tolerance", tolerance, "must be positive"));
    }
    if low <= Decimal::ZERO {
        return Err(PricingError::invalid("low", low, "must be positive"));
    }
    if high < low {
        return Err(PricingError::invalid("high", high, "must not be below low"));
    }

    let gap = |amount: Decimal| -> Result<Decimal, PricingError> {
        let result = engine.compare(amount, rates, options)?;
        let payout = |id: ProviderId| {
            result
                .outcome(id)
                .map(|o| o.breakdown.final_amount)
                .ok_or_else(|| PricingError::UnknownProvider(id.to_string()))
        };
        Ok(payout(challenger)? - payout(incumbent)?)
    };

    if gap(low)? >= Decimal::ZERO {
        return Ok(Some(low));
    }
    if gap(high)? < Decimal::ZERO {
        return Ok(None);
    }

    let (mut lo, mut hi) = (low, high);
    let mut steps = 0;
    while hi - lo > tolerance && steps < MAX_BISECTION_STEPS {
        let mid = (lo + hi) / Decimal::TWO;
        if mid == lo || mid == hi {
            break;
        }
        steps += 1;
        if gap(mid)? >= Decimal::ZERO {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    log::debug!(
        "{} catches up with {} at about {} after {} steps",
        challenger,
        incumbent,
        hi,
        steps
    );
    Ok(Some(hi))
}
