//! The cost calculator.
//!
//! Turns a send amount, a mid rate and a provider's cost model into a full
//! breakdown of where the money goes. Costs are applied in a fixed order:
//!
//! 1. FX spread against the mid rate,
//! 2. explicit fee on the post-spread amount,
//! 3. IOF tax on the post-fee amount.
//!
//! Reordering the steps changes the numbers (fee-on-spread, tax-on-fee), so
//! the order is part of the model.

use crate::core::error::{PricingError, PricingWarning};
use crate::core::provider::ProviderId;
use crate::pricing::model::{FeeSchedule, IofLabel, IofRegime, ProviderCostModel, BPS_PER_UNIT};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-call knobs for [`compute_breakdown`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakdownOptions {
    /// Only consulted by regime-dependent IOF behaviours. `None` = standard.
    pub regime: Option<IofRegime>,
    /// Replaces the model's spread, for what-if sliders.
    pub spread_override_bps: Option<Decimal>,
    /// `fee currency -> destination` rate, needed only for fees fixed in a
    /// third currency.
    pub reference_rate: Option<Decimal>,
}

impl BreakdownOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regime(mut self, regime: IofRegime) -> Self {
        self.regime = Some(regime);
        self
    }

    pub fn with_spread_override(mut self, bps: Decimal) -> Self {
        self.spread_override_bps = Some(bps);
        self
    }

    pub fn with_reference_rate(mut self, rate: Decimal) -> Self {
        self.reference_rate = Some(rate);
        self
    }
}

/// Where the money goes for one provider and one input.
///
/// All amounts are in the destination currency except `source_amount`.
/// `final_amount + total_cost_amount == market_reference_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub provider_id: ProviderId,
    pub source_amount: Decimal,
    pub mid_rate: Decimal,
    /// What the amount is worth at mid, with no costs at all.
    pub market_reference_amount: Decimal,
    pub effective_spread_bps: Decimal,
    pub execution_rate: Decimal,
    pub amount_after_spread: Decimal,
    pub fx_spread_cost: Decimal,
    pub explicit_fee_cost: Decimal,
    pub amount_after_fee: Decimal,
    pub regime: IofRegime,
    pub effective_iof_pct: Decimal,
    pub iof_label: IofLabel,
    pub iof_tax_cost: Decimal,
    pub final_amount: Decimal,
    pub total_cost_amount: Decimal,
    /// Total cost as a percentage of the reference amount. 0 when the
    /// reference amount is 0.
    pub total_cost_pct: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PricingWarning>,
}

/// The three cost components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    FxSpread,
    ExplicitFee,
    IofTax,
}

impl fmt::Display for CostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostKind::FxSpread => f.write_str("FX spread"),
            CostKind::ExplicitFee => f.write_str("Explicit fee"),
            CostKind::IofTax => f.write_str("IOF"),
        }
    }
}

/// One slice of a stacked cost bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLayer {
    pub kind: CostKind,
    pub amount: Decimal,
    /// Share of the reference amount, in basis points.
    pub bps: Decimal,
}

impl CostBreakdown {
    /// Each cost as an amount and as bps of the reference amount.
    pub fn cost_layers(&self) -> Vec<CostLayer> {
        [
            (CostKind::FxSpread, self.fx_spread_cost),
            (CostKind::ExplicitFee, self.explicit_fee_cost),
            (CostKind::IofTax, self.iof_tax_cost),
        ]
        .into_iter()
        .map(|(kind, amount)| CostLayer {
            kind,
            amount,
            bps: self.to_bps(amount),
        })
        .collect()
    }

    pub fn total_cost_bps(&self) -> Decimal {
        self.to_bps(self.total_cost_amount)
    }

    /// Destination units received per source unit, after every cost.
    pub fn effective_rate(&self) -> Decimal {
        if self.source_amount.is_zero() {
            Decimal::ZERO
        } else {
            self.final_amount / self.source_amount
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.warnings.contains(&PricingWarning::DegenerateResult)
    }

    fn to_bps(&self, amount: Decimal) -> Decimal {
        if self.market_reference_amount.is_zero() {
            Decimal::ZERO
        } else {
            amount / self.market_reference_amount * BPS_PER_UNIT
        }
    }
}

impl fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.provider_id.display_name())?;
        writeln!(f, "Send amount:      {}", self.source_amount)?;
        writeln!(f, "Mid rate:         {}", self.mid_rate)?;
        writeln!(f, "Reference:        {:.2}", self.market_reference_amount)?;
        writeln!(
            f,
            "FX spread:        {:.2}  ({} bps, execution rate {:.6})",
            self.fx_spread_cost, self.effective_spread_bps, self.execution_rate
        )?;
        writeln!(f, "Explicit fee:     {:.2}", self.explicit_fee_cost)?;
        writeln!(
            f,
            "IOF:              {:.2}  ({}%, {:?})",
            self.iof_tax_cost, self.effective_iof_pct, self.iof_label
        )?;
        writeln!(f, "Final amount:     {:.2}", self.final_amount)?;
        writeln!(
            f,
            "Total cost:       {:.2}  ({:.2}%)",
            self.total_cost_amount, self.total_cost_pct
        )?;
        for warning in &self.warnings {
            writeln!(f, "Warning:          {}", warning)?;
        }
        Ok(())
    }
}

/// Unwrap a checked product, reporting `field` when it left Decimal's range.
fn representable(
    value: Option<Decimal>,
    field: &'static str,
    input: Decimal,
) -> Result<Decimal, PricingError> {
    value.ok_or_else(|| {
        PricingError::invalid(field, input, "amount x rate exceeds representable range")
    })
}

/// Compute the cost breakdown of sending `source_amount` at `mid_rate`
/// through the provider described by `model`.
///
/// # Errors
///
/// - `InvalidInput` for a negative amount, a non-positive mid rate, a
///   spread override outside 0-10000 bps, or a non-positive reference rate.
/// - `MissingReferenceRate` when the fee is fixed in a third currency and
///   no reference rate was supplied.
///
/// A zero amount is valid and yields an all-zero breakdown flagged with
/// [`PricingWarning::DegenerateResult`].
///
/// # Examples
///
/// ```
/// use remit_pricing::pricing::calculator::{compute_breakdown, BreakdownOptions};
/// use remit_pricing::pricing::registry::ProviderRegistry;
/// use remit_pricing::core::provider::ProviderId;
/// use rust_decimal_macros::dec;
///
/// let registry = ProviderRegistry::canonical();
/// let bank = registry.get(ProviderId::Bank).unwrap();
/// let b = compute_breakdown(dec!(100_000), dec!(4.9876), bank, &BreakdownOptions::new()).unwrap();
///
/// assert_eq!(b.market_reference_amount, dec!(498_760));
/// assert_eq!(b.final_amount.round_dp(2), dec!(465_516.65));
/// ```
pub fn compute_breakdown(
    source_amount: Decimal,
    mid_rate: Decimal,
    model: &ProviderCostModel,
    options: &BreakdownOptions,
) -> Result<CostBreakdown, PricingError> {
    if source_amount < Decimal::ZERO {
        return Err(PricingError::invalid(
            "source_amount",
            source_amount,
            "must not be negative",
        ));
    }
    if mid_rate <= Decimal::ZERO {
        return Err(PricingError::invalid("mid_rate", mid_rate, "must be positive"));
    }
    let spread_bps = options.spread_override_bps.unwrap_or(model.fx_spread_bps);
    if spread_bps < Decimal::ZERO || spread_bps > BPS_PER_UNIT {
        return Err(PricingError::invalid(
            "spread_override_bps",
            spread_bps,
            "must be within 0-10000",
        ));
    }

    let regime = options.regime.unwrap_or_default();
    let effective_iof_pct = model.iof.resolve(options.regime);
    let iof_label = model.iof.label(options.regime);

    // 1. Spread
    let market_reference_amount =
        representable(source_amount.checked_mul(mid_rate), "source_amount", source_amount)?;
    let execution_rate = mid_rate * (Decimal::ONE - spread_bps / BPS_PER_UNIT);

    if source_amount.is_zero() {
        log::warn!(
            "{}: zero send amount, returning an empty breakdown",
            model.provider_id
        );
        return Ok(CostBreakdown {
            provider_id: model.provider_id,
            source_amount,
            mid_rate,
            market_reference_amount: Decimal::ZERO,
            effective_spread_bps: spread_bps,
            execution_rate,
            amount_after_spread: Decimal::ZERO,
            fx_spread_cost: Decimal::ZERO,
            explicit_fee_cost: Decimal::ZERO,
            amount_after_fee: Decimal::ZERO,
            regime,
            effective_iof_pct,
            iof_label,
            iof_tax_cost: Decimal::ZERO,
            final_amount: Decimal::ZERO,
            total_cost_amount: Decimal::ZERO,
            total_cost_pct: Decimal::ZERO,
            warnings: vec![PricingWarning::DegenerateResult],
        });
    }

    let amount_after_spread =
        representable(source_amount.checked_mul(execution_rate), "source_amount", source_amount)?;
    let fx_spread_cost = market_reference_amount - amount_after_spread;

    // 2. Fee
    let explicit_fee_cost = match &model.fee {
        FeeSchedule::FixedSourceCurrency { amount } => {
            representable(amount.checked_mul(mid_rate), "fee_amount", *amount)?
        }
        FeeSchedule::FixedReferenceCurrency { amount, currency } => {
            let rate = options
                .reference_rate
                .ok_or_else(|| PricingError::MissingReferenceRate {
                    currency: currency.clone(),
                })?;
            if rate <= Decimal::ZERO {
                return Err(PricingError::invalid("reference_rate", rate, "must be positive"));
            }
            representable(amount.checked_mul(rate), "fee_amount", *amount)?
        }
        FeeSchedule::Percentage { pct } => {
            representable(amount_after_spread.checked_mul(*pct), "fee_pct", *pct)? / Decimal::ONE_HUNDRED
        }
        FeeSchedule::None => Decimal::ZERO,
    };
    let amount_after_fee = amount_after_spread - explicit_fee_cost;

    // 3. Tax, never on a negative base
    let taxable = amount_after_fee.max(Decimal::ZERO);
    let iof_tax_cost = representable(
        taxable.checked_mul(effective_iof_pct),
        "iof_pct",
        effective_iof_pct,
    )? / Decimal::ONE_HUNDRED;
    let final_amount = amount_after_fee - iof_tax_cost;

    let total_cost_amount = representable(
        fx_spread_cost
            .checked_add(explicit_fee_cost)
            .and_then(|sum| sum.checked_add(iof_tax_cost)),
        "source_amount",
        source_amount,
    )?;
    let mut warnings = Vec::new();
    let total_cost_pct = if market_reference_amount.is_zero() {
        warnings.push(PricingWarning::DegenerateResult);
        Decimal::ZERO
    } else {
        representable(
            total_cost_amount
                .checked_div(market_reference_amount)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED)),
            "source_amount",
            source_amount,
        )?
    };
    if final_amount < Decimal::ZERO {
        warnings.push(PricingWarning::NegativePayout { final_amount });
    }
    for warning in &warnings {
        log::warn!("{}: {}", model.provider_id, warning);
    }

    log::debug!(
        "{}: amount={} mid={} spread={}bps iof={}% -> final={} cost={}",
        model.provider_id,
        source_amount,
        mid_rate,
        spread_bps,
        effective_iof_pct,
        final_amount,
        total_cost_amount
    );

    Ok(CostBreakdown {
        provider_id: model.provider_id,
        source_amount,
        mid_rate,
        market_reference_amount,
        effective_spread_bps: spread_bps,
        execution_rate,
        amount_after_spread,
        fx_spread_cost,
        explicit_fee_cost,
        amount_after_fee,
        regime,
        effective_iof_pct,
        iof_label,
        iof_tax_cost,
        final_amount,
        total_cost_amount,
        total_cost_pct,
        warnings,
    })
}
