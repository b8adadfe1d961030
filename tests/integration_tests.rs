use remit_pricing::core::currency::{CurrencyCode, CurrencyPair};
use remit_pricing::core::error::{PricingError, PricingWarning};
use remit_pricing::core::provider::ProviderId;
use remit_pricing::core::quote::{Confidence, MarketQuote, PricingMode};
use remit_pricing::core::rates::FxRateTable;
use remit_pricing::pricing::calculator::{compute_breakdown, BreakdownOptions};
use remit_pricing::pricing::comparison::{
    compare_providers, ComparisonEngine, ComparisonOptions, SavingsLabel,
};
use remit_pricing::pricing::model::{IofLabel, IofRegime};
use remit_pricing::pricing::registry::ProviderRegistry;
use remit_pricing::simulation::sweep::{find_break_even, sweep_amounts, SweepConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn gbp_brl_rates() -> FxRateTable {
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
    rates
}

/// Full pipeline: rates → routes → per-provider breakdowns → ranking.
#[test]
fn full_comparison_gbp_to_brl() {
    let rates = gbp_brl_rates();
    let result = compare_providers(dec!(10_000), &rates, &ComparisonOptions::default()).unwrap();

    assert_eq!(result.models.len(), 3);
    assert_eq!(
        result.ranking,
        vec![ProviderId::Coins, ProviderId::Wise, ProviderId::Bank]
    );
    assert_eq!(result.best_provider_id, ProviderId::Coins);
    assert!(result.savings_vs_bank > Decimal::ZERO);
    assert!(result.savings_vs_other_provider > Decimal::ZERO);
    assert_eq!(result.savings_label_kind, SavingsLabel::Savings);

    // Each provider priced off its own route.
    let bank = result.outcome(ProviderId::Bank).unwrap();
    assert_eq!(bank.route.legs.len(), 2);
    assert_eq!(bank.route.effective_rate, dec!(1.27) * dec!(5.19));
    assert_eq!(bank.settlement_layers, 4);

    let coins = result.outcome(ProviderId::Coins).unwrap();
    assert_eq!(coins.route.legs[0].to, CurrencyCode::usdt());
    assert_eq!(coins.route.confidence, Confidence::Cached);

    // Partition holds for every provider.
    for outcome in &result.models {
        let b = &outcome.breakdown;
        let gap = (b.final_amount + b.total_cost_amount - b.market_reference_amount).abs();
        assert!(gap < dec!(0.000001), "{}: partition off by {}", b.provider_id, gap);
    }
}

/// The documented bank scenario, end to end through the registry.
#[test]
fn bank_scenario_matches_reference_figures() {
    let registry = ProviderRegistry::canonical();
    let bank = registry.get_by_name("bank").unwrap();
    let b = compute_breakdown(dec!(100_000), dec!(4.9876), bank, &BreakdownOptions::new()).unwrap();

    assert_eq!(b.market_reference_amount, dec!(498_760));
    assert_eq!(b.fx_spread_cost, dec!(12_469));
    assert_eq!(b.explicit_fee_cost.round_dp(2), dec!(3_890.33));
    assert_eq!(b.iof_tax_cost.round_dp(2), dec!(16_884.02));
    assert_eq!(b.final_amount.round_dp(2), dec!(465_516.65));
    assert_eq!(b.iof_label, IofLabel::Standard);
    assert_eq!(b.cost_layers().len(), 3);
}

#[test]
fn optimized_regime_moves_wise_and_coins_only() {
    let rates = gbp_brl_rates();
    let standard = compare_providers(dec!(5_000), &rates, &ComparisonOptions::default()).unwrap();
    let optimized = compare_providers(
        dec!(5_000),
        &rates,
        &ComparisonOptions::default().with_regime(IofRegime::Optimized),
    )
    .unwrap();

    let final_of = |r: &remit_pricing::pricing::comparison::ComparisonResult, id| {
        r.outcome(id).unwrap().breakdown.final_amount
    };
    assert_eq!(
        final_of(&standard, ProviderId::Bank),
        final_of(&optimized, ProviderId::Bank)
    );
    assert!(final_of(&optimized, ProviderId::Wise) > final_of(&standard, ProviderId::Wise));
    assert!(final_of(&optimized, ProviderId::Coins) > final_of(&standard, ProviderId::Coins));

    let coins = &optimized.outcome(ProviderId::Coins).unwrap().breakdown;
    assert_eq!(coins.effective_iof_pct, dec!(0.38));
    assert_eq!(coins.iof_label, IofLabel::Variable);
    let wise = &optimized.outcome(ProviderId::Wise).unwrap().breakdown;
    assert_eq!(wise.effective_iof_pct, dec!(1.1));
    assert_eq!(wise.iof_label, IofLabel::Optimized);
}

#[test]
fn unknown_provider_is_an_error() {
    let registry = ProviderRegistry::canonical();
    let err = registry.get_by_name("western_union").unwrap_err();
    assert!(matches!(err, PricingError::UnknownProvider(ref name) if name == "western_union"));
    assert!(err.to_string().contains("western_union"));
}

#[test]
fn dead_feed_aborts_comparison() {
    let mut rates = gbp_brl_rates();
    rates.insert(MarketQuote::unavailable(CurrencyPair::new(
        CurrencyCode::usdt(),
        CurrencyCode::brl(),
    )));
    let err = compare_providers(dec!(1_000), &rates, &ComparisonOptions::default()).unwrap_err();
    assert!(matches!(err, PricingError::InvalidInput { field: "mid_rate", .. }));
}

#[test]
fn missing_leg_aborts_comparison() {
    let mut rates = FxRateTable::new();
    rates
        .set_mid(CurrencyCode::gbp(), CurrencyCode::usd(), dec!(1.27))
        .unwrap();
    let err = compare_providers(dec!(1_000), &rates, &ComparisonOptions::default()).unwrap_err();
    assert!(matches!(err, PricingError::Rate(_)));
}

#[test]
fn zero_amount_is_degenerate_not_an_error() {
    let rates = gbp_brl_rates();
    let result = compare_providers(Decimal::ZERO, &rates, &ComparisonOptions::default()).unwrap();
    for outcome in &result.models {
        assert_eq!(outcome.breakdown.final_amount, Decimal::ZERO);
        assert_eq!(outcome.breakdown.total_cost_pct, Decimal::ZERO);
        assert!(outcome
            .breakdown
            .warnings
            .contains(&PricingWarning::DegenerateResult));
    }
    // All tied at zero: declaration order decides.
    assert_eq!(result.best_provider_id, ProviderId::Bank);
}

#[test]
fn comparison_serializes_decimals_as_strings() {
    let rates = gbp_brl_rates();
    let result = compare_providers(dec!(250), &rates, &ComparisonOptions::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["best_provider_id"], "coins");
    assert_eq!(json["source_amount"], "250");
    assert_eq!(json["ranking"][2], "bank");
    assert!(json["models"][0]["breakdown"]["final_amount"].is_string());
    assert_eq!(json["models"][0]["breakdown"]["regime"], "standard");
}

#[test]
fn custom_registry_file_changes_the_ranking() {
    let json = r#"{
      "providers": [
        { "provider_id": "bank", "fx_spread_bps": "0",
          "fee": { "type": "none" },
          "iof": { "type": "fixed", "pct": "0" },
          "settlement_layers": 1, "settlement_route": "via_usd" },
        { "provider_id": "wise", "fx_spread_bps": "50",
          "fee": { "type": "percentage", "pct": "0.89" },
          "iof": { "type": "regime_dependent", "standard_pct": "3.5", "optimized_pct": "1.1" },
          "settlement_layers": 2, "settlement_route": "via_usd" },
        { "provider_id": "coins", "fx_spread_bps": "15",
          "fee": { "type": "fixed_reference_currency", "amount": "5", "currency": "USD" },
          "iof": { "type": "structure_dependent", "standard_pct": "3.5", "optimized_pct": "0.38" },
          "settlement_layers": 1, "settlement_route": "via_stablecoin" }
      ]
    }"#;
    let registry = ProviderRegistry::from_json(json).unwrap();
    let engine = ComparisonEngine::with_registry(registry);
    let result = engine
        .compare(dec!(1_000), &gbp_brl_rates(), &ComparisonOptions::default())
        .unwrap();
    assert_eq!(result.best_provider_id, ProviderId::Bank);

    // $5 converted at the USD/BRL mid of the same feed.
    let coins = &result.outcome(ProviderId::Coins).unwrap().breakdown;
    assert_eq!(coins.explicit_fee_cost, dec!(5) * dec!(5.19));
}

#[test]
fn sweep_and_break_even_agree() {
    let json = r#"{
      "providers": [
        { "provider_id": "bank", "fx_spread_bps": "250",
          "fee": { "type": "percentage", "pct": "0.8" },
          "iof": { "type": "fixed", "pct": "3.5" },
          "settlement_layers": 4, "settlement_route": "via_usd" },
        { "provider_id": "wise", "fx_spread_bps": "0",
          "fee": { "type": "fixed_source_currency", "amount": "20" },
          "iof": { "type": "fixed", "pct": "3.5" },
          "settlement_layers": 2, "settlement_route": "via_usd" },
        { "provider_id": "coins", "fx_spread_bps": "40",
          "fee": { "type": "none" },
          "iof": { "type": "fixed", "pct": "3.5" },
          "settlement_layers": 1, "settlement_route": "via_usd" }
      ]
    }"#;
    let engine = ComparisonEngine::with_registry(ProviderRegistry::from_json(json).unwrap());
    let rates = gbp_brl_rates();
    let options = ComparisonOptions::default();

    // 0.4% of A equals £20 at A = 5000.
    let at = find_break_even(
        &engine,
        ProviderId::Wise,
        ProviderId::Coins,
        dec!(100),
        dec!(50_000),
        dec!(0.5),
        &rates,
        &options,
    )
    .unwrap()
    .unwrap();
    assert!((at - dec!(5_000)).abs() <= dec!(0.5));

    let points = sweep_amounts(
        &engine,
        &SweepConfig {
            from: dec!(1_000),
            to: dec!(9_000),
            step: dec!(1_000),
        },
        &rates,
        &options,
    )
    .unwrap();
    for point in &points {
        let expected = if point.amount < dec!(5_000) {
            ProviderId::Coins
        } else if point.amount > dec!(5_000) {
            ProviderId::Wise
        } else {
            // Exact tie at 5000: Wise is declared before Coins.
            ProviderId::Wise
        };
        assert_eq!(point.best_provider_id, expected, "at {}", point.amount);
    }
}

#[test]
fn conservative_mode_executes_at_the_bid() {
    let rates = gbp_brl_rates();
    let amount = dec!(10_000);
    let indicative = compare_providers(amount, &rates, &ComparisonOptions::default()).unwrap();
    let conservative = compare_providers(
        amount,
        &rates,
        &ComparisonOptions::default().with_pricing_mode(PricingMode::Conservative),
    )
    .unwrap();

    assert_eq!(conservative.pricing_mode, PricingMode::Conservative);
    for id in ProviderId::ALL {
        let mid = indicative.outcome(id).unwrap();
        let edge = conservative.outcome(id).unwrap();
        assert!(edge.breakdown.final_amount < mid.breakdown.final_amount);
        assert!(edge.route.slippage_bps > Decimal::ZERO);
    }

    // GBP/USDT has no bid, so only the USDT/BRL leg slips.
    let coins = conservative.outcome(ProviderId::Coins).unwrap();
    assert_eq!(coins.route.legs[0].slippage_bps, Decimal::ZERO);
    assert!(coins.route.legs[1].slippage_bps > Decimal::ZERO);

    let bank = conservative.outcome(ProviderId::Bank).unwrap();
    assert_eq!(bank.route.effective_rate, dec!(1.2698) * dec!(5.188));
}
