//! Single-provider cost decomposition example.
//!
//! Shows where the money goes when a traditional bank converts
//! £100,000 at a mid rate of 4.9876, then how a spread what-if and the
//! optimized IOF regime move the result for Wise.

use remit_pricing::core::provider::ProviderId;
use remit_pricing::pricing::calculator::{compute_breakdown, BreakdownOptions};
use remit_pricing::pricing::model::IofRegime;
use remit_pricing::pricing::registry::ProviderRegistry;
use remit_pricing::simulation::what_if::{regime_uplift, spread_what_if};
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  remit-pricing: Basic Cost Breakdown Example  ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let registry = ProviderRegistry::canonical();

    // --- Scenario 1: Bank breakdown ---
    println!("━━━ Scenario 1: Traditional Bank, £100,000 @ 4.9876 ━━━\n");

    let bank = registry.get(ProviderId::Bank).expect("bank is in the canonical table");
    let breakdown = compute_breakdown(dec!(100_000), dec!(4.9876), bank, &BreakdownOptions::new())
        .expect("valid input");
    println!("{}", breakdown);

    for layer in breakdown.cost_layers() {
        println!("  {:<10} {:>14} ({} bps)", layer.kind, layer.amount.round_dp(2), layer.bps.round_dp(1));
    }
    println!();

    // --- Scenario 2: Wise spread what-if ---
    println!("━━━ Scenario 2: Wise, spread what-if on £10,000 ━━━\n");

    let wise = registry.get(ProviderId::Wise).expect("wise is in the canonical table");
    let spreads = [dec!(0), dec!(25), dec!(50), dec!(100), dec!(200)];
    let points = spread_what_if(dec!(10_000), dec!(6.5913), wise, &spreads, &BreakdownOptions::new())
        .expect("valid spreads");
    for p in &points {
        println!(
            "  {:>5} bps → R$ {:>12}  ({}% total cost)",
            p.spread_bps,
            p.final_amount.round_dp(2),
            p.total_cost_pct.round_dp(2)
        );
    }
    println!();

    // --- Scenario 3: Regime ---
    println!("━━━ Scenario 3: Optimized IOF regime on £10,000 ━━━\n");

    let options = BreakdownOptions::new();
    for model in registry.iter() {
        let uplift = regime_uplift(dec!(10_000), dec!(6.5913), model, &options).expect("valid input");
        let optimized = compute_breakdown(
            dec!(10_000),
            dec!(6.5913),
            model,
            &BreakdownOptions::new().with_regime(IofRegime::Optimized),
        )
        .expect("valid input");
        println!(
            "  {:<18} IOF {}% ({:?})  uplift R$ {}",
            model.provider_id.display_name(),
            optimized.effective_iof_pct,
            optimized.iof_label,
            uplift.round_dp(2)
        );
    }
}
