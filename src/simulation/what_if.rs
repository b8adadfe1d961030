//! What-if analysis on a single provider: spread sliders and regime toggles.

use crate::core::error::PricingError;
use crate::pricing::calculator::{compute_breakdown, BreakdownOptions};
use crate::pricing::model::{IofRegime, ProviderCostModel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of one spread setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadPoint {
    pub spread_bps: Decimal,
    pub final_amount: Decimal,
    pub total_cost_pct: Decimal,
}

/// Re-price `model` once per spread in `spreads`, all else held fixed.
pub fn spread_what_if(
    source_amount: Decimal,
    mid_rate: Decimal,
    model: &ProviderCostModel,
    spreads: &[Decimal],
    options: &BreakdownOptions,
) -> Result<Vec<SpreadPoint>, PricingError> {
    spreads
        .iter()
        .map(|bps| {
            let opts = options.clone().with_spread_override(*bps);
            let b = compute_breakdown(source_amount, mid_rate, model, &opts)?;
            Ok(SpreadPoint {
                spread_bps: *bps,
                final_amount: b.final_amount,
                total_cost_pct: b.total_cost_pct,
            })
        })
        .collect()
}

/// How much more the optimized regime pays out than the standard one.
/// Zero for providers with a fixed IOF rate.
pub fn regime_uplift(
    source_amount: Decimal,
    mid_rate: Decimal,
    model: &ProviderCostModel,
    options: &BreakdownOptions,
) -> Result<Decimal, PricingError> {
    let standard = compute_breakdown(
        source_amount,
        mid_rate,
        model,
        &options.clone().with_regime(IofRegime::Standard),
    )?;
    let optimized = compute_breakdown(
        source_amount,
        mid_rate,
        model,
        &options.clone().with_regime(IofRegime::Optimized),
    )?;
    Ok(optimized.final_amount - standard.final_amount)
}
