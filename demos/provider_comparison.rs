//! Three-provider comparison example.
//!
//! Builds a GBP→BRL rate table, ranks the bank, Wise and Coins for a
//! £10,000 transfer, then sweeps the send amount against a Wise variant
//! charging a flat fee to find where it catches up with Coins.

use remit_pricing::core::currency::{CurrencyCode, CurrencyPair};
use remit_pricing::core::provider::ProviderId;
use remit_pricing::core::quote::{Confidence, MarketQuote};
use remit_pricing::core::rates::FxRateTable;
use remit_pricing::pricing::comparison::{ComparisonEngine, ComparisonOptions};
use remit_pricing::pricing::model::{FeeSchedule, IofRegime};
use remit_pricing::pricing::registry::ProviderRegistry;
use remit_pricing::simulation::fx_shock::fx_shock;
use remit_pricing::simulation::sweep::find_break_even;
use rust_decimal_macros::dec;

fn main() {
    println!("╔═════════════════════════════════════════════════╗");
    println!("║  remit-pricing: Provider Comparison Example     ║");
    println!("╚═════════════════════════════════════════════════╝\n");

    let mut rates = FxRateTable::new();
    rates.insert(MarketQuote::from_bid_ask(
        CurrencyPair::new(CurrencyCode::gbp(), CurrencyCode::usd()),
        dec!(1.2698),
        dec!(1.2702),
    ));
    rates.insert(MarketQuote::from_bid_ask(
        CurrencyPair::new(CurrencyCode::usd(), CurrencyCode::brl()),
        dec!(5.188),
        dec!(5.192),
    ));
    rates.insert(
        MarketQuote::indicative(
            CurrencyPair::new(CurrencyCode::gbp(), CurrencyCode::usdt()),
            dec!(1.2705),
        )
        .with_confidence(Confidence::Cached),
    );
    rates.insert(MarketQuote::from_bid_ask(
        CurrencyPair::new(CurrencyCode::usdt(), CurrencyCode::brl()),
        dec!(5.19),
        dec!(5.20),
    ));

    // --- Scenario 1: Standard regime ---
    println!("━━━ Scenario 1: £10,000 GBP→BRL, standard regime ━━━\n");

    let engine = ComparisonEngine::new();
    let options = ComparisonOptions::default();
    let result = engine
        .compare(dec!(10_000), &rates, &options)
        .expect("all legs are quoted");
    println!("{}", result);

    // --- Scenario 2: Optimized regime ---
    println!("━━━ Scenario 2: Same transfer, optimized regime ━━━\n");

    let optimized = engine
        .compare(
            dec!(10_000),
            &rates,
            &ComparisonOptions::default().with_regime(IofRegime::Optimized),
        )
        .expect("all legs are quoted");
    for id in &optimized.ranking {
        if let Some(delta) = optimized.delta_bps_vs(*id) {
            println!("  {:<18} {:>8} bps behind best", id.display_name(), delta.round_dp(1));
        }
    }
    println!();

    // --- Scenario 3: BRL weakens 10% ---
    println!("━━━ Scenario 3: BRL weakens 10% ━━━\n");

    for shock in fx_shock(&engine, dec!(10_000), dec!(10), &rates, &options).expect("valid shock") {
        println!(
            "  {:<18} R$ {:>12} → R$ {:>12}",
            shock.provider_id.display_name(),
            shock.baseline_final.round_dp(2),
            shock.shocked_final.round_dp(2)
        );
    }
    println!();

    // --- Scenario 4: Flat-fee break-even ---
    println!("━━━ Scenario 4: Wise with a £9.99 flat fee vs Coins ━━━\n");

    let models = ProviderRegistry::canonical()
        .iter()
        .cloned()
        .map(|mut m| {
            if m.provider_id == ProviderId::Wise {
                m.fx_spread_bps = dec!(0);
                m.fee = FeeSchedule::FixedSourceCurrency { amount: dec!(9.99) };
            }
            m
        })
        .collect();
    let flat_fee = ComparisonEngine::with_registry(
        ProviderRegistry::new(models).expect("variant table is valid"),
    );
    match find_break_even(
        &flat_fee,
        ProviderId::Wise,
        ProviderId::Coins,
        dec!(1),
        dec!(1_000_000),
        dec!(0.01),
        &rates,
        &options,
    )
    .expect("valid range")
    {
        Some(at) => println!("  Wise catches up with Coins from about £{}", at.round_dp(2)),
        None => println!("  Wise never catches up with Coins below £1,000,000"),
    }
}
