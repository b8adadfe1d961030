use approx::relative_eq;
use proptest::prelude::*;
use remit_pricing::core::currency::{CurrencyCode, CurrencyPair};
use remit_pricing::core::provider::ProviderId;
use remit_pricing::core::quote::MarketQuote;
use remit_pricing::core::rates::FxRateTable;
use remit_pricing::pricing::calculator::{compute_breakdown, BreakdownOptions};
use remit_pricing::pricing::comparison::{ComparisonEngine, ComparisonOptions};
use remit_pricing::pricing::model::{
    FeeSchedule, IofBehavior, IofRegime, ProviderCostModel, SettlementRoute,
};
use remit_pricing::pricing::registry::ProviderRegistry;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Generate a send amount from 0.00 to 1,000,000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate a positive mid rate with four decimals (0.0001 to 20.0000).
fn arb_mid() -> impl Strategy<Value = Decimal> {
    (1i64..200_000i64).prop_map(|r| Decimal::new(r, 4))
}

/// Generate a spread between 0 and 1000 bps.
fn arb_spread() -> impl Strategy<Value = Decimal> {
    (0u32..=1000u32).prop_map(Decimal::from)
}

/// Generate a percentage from 0.00 to 10.00.
fn arb_pct() -> impl Strategy<Value = Decimal> {
    (0i64..=1000i64).prop_map(|p| Decimal::new(p, 2))
}

fn arb_provider() -> impl Strategy<Value = ProviderId> {
    prop::sample::select(ProviderId::ALL.to_vec())
}

fn arb_regime() -> impl Strategy<Value = IofRegime> {
    prop::sample::select(vec![IofRegime::Standard, IofRegime::Optimized])
}

/// Generate a fee schedule that never needs a reference rate.
fn arb_fee() -> impl Strategy<Value = FeeSchedule> {
    prop_oneof![
        arb_pct().prop_map(|pct| FeeSchedule::Percentage { pct }),
        (0i64..5_000i64).prop_map(|c| FeeSchedule::FixedSourceCurrency {
            amount: Decimal::new(c, 2)
        }),
        Just(FeeSchedule::None),
    ]
}

/// Generate a random, valid cost model.
fn arb_model() -> impl Strategy<Value = ProviderCostModel> {
    (arb_provider(), arb_spread(), arb_fee(), arb_pct(), arb_pct()).prop_map(
        |(provider_id, fx_spread_bps, fee, a, b)| ProviderCostModel {
            provider_id,
            fx_spread_bps,
            fee,
            iof: IofBehavior::RegimeDependent {
                standard_pct: a.max(b),
                optimized_pct: a.min(b),
            },
            settlement_layers: 1,
            settlement_route: SettlementRoute::Direct,
        },
    )
}

/// A single-provider model with a fixed IOF rate.
fn fixed_model(fx_spread_bps: Decimal, fee: FeeSchedule, iof_pct: Decimal) -> ProviderCostModel {
    ProviderCostModel {
        provider_id: ProviderId::Wise,
        fx_spread_bps,
        fee,
        iof: IofBehavior::Fixed { pct: iof_pct },
        settlement_layers: 1,
        settlement_route: SettlementRoute::Direct,
    }
}

fn direct_rates(mid: Decimal) -> FxRateTable {
    let mut rates = FxRateTable::new();
    for (base, quote) in [
        (CurrencyCode::gbp(), CurrencyCode::usd()),
        (CurrencyCode::gbp(), CurrencyCode::usdt()),
    ] {
        rates.insert(MarketQuote::indicative(CurrencyPair::new(base, quote), Decimal::ONE));
    }
    rates.insert(MarketQuote::indicative(
        CurrencyPair::new(CurrencyCode::usd(), CurrencyCode::brl()),
        mid,
    ));
    rates.insert(MarketQuote::indicative(
        CurrencyPair::new(CurrencyCode::usdt(), CurrencyCode::brl()),
        mid,
    ));
    rates
}

proptest! {
    // ===================================================================
    // INVARIANT 1: Costs partition the market reference amount.
    //
    // Whatever the model and input, spread + fee + tax + final amount
    // adds back up to amount × mid. Nothing is lost or invented.
    // ===================================================================
    #[test]
    fn costs_partition_reference(
        amount in arb_amount(),
        mid in arb_mid(),
        model in arb_model(),
        regime in arb_regime(),
    ) {
        let opts = BreakdownOptions::new().with_regime(regime);
        let b = compute_breakdown(amount, mid, &model, &opts).unwrap();
        let gap = (b.final_amount + b.total_cost_amount - b.market_reference_amount).abs();
        prop_assert!(
            gap < Decimal::new(1, 12),
            "final {} + cost {} != reference {}",
            b.final_amount,
            b.total_cost_amount,
            b.market_reference_amount
        );
    }

    // ===================================================================
    // INVARIANT 2: A wider spread never pays out more.
    //
    // Holding everything else fixed, raising the spread can only lower
    // the final amount.
    // ===================================================================
    #[test]
    fn wider_spread_never_pays_more(
        amount in arb_amount(),
        mid in arb_mid(),
        model in arb_model(),
        a in arb_spread(),
        b in arb_spread(),
    ) {
        let (narrow, wide) = (a.min(b), a.max(b));
        let at = |bps| {
            compute_breakdown(
                amount,
                mid,
                &model,
                &BreakdownOptions::new().with_spread_override(bps),
            )
            .unwrap()
            .final_amount
        };
        prop_assert!(at(wide) <= at(narrow));
    }

    // ===================================================================
    // INVARIANT 3: The optimized regime never pays out less.
    //
    // Only the IOF rate changes between regimes, and every provider's
    // optimized rate is at most its standard one.
    // ===================================================================
    #[test]
    fn optimized_regime_never_pays_less(
        amount in arb_amount(),
        mid in arb_mid(),
        id in arb_provider(),
    ) {
        let registry = ProviderRegistry::canonical();
        let model = registry.get(id).unwrap();
        let run = |regime| {
            compute_breakdown(amount, mid, model, &BreakdownOptions::new().with_regime(regime))
                .unwrap()
        };
        let standard = run(IofRegime::Standard);
        let optimized = run(IofRegime::Optimized);
        prop_assert!(optimized.final_amount >= standard.final_amount);
        prop_assert_eq!(optimized.fx_spread_cost, standard.fx_spread_cost);
        prop_assert_eq!(optimized.explicit_fee_cost, standard.explicit_fee_cost);
    }

    // ===================================================================
    // INVARIANT 4: A model with no costs returns exactly amount × mid.
    // ===================================================================
    #[test]
    fn zero_cost_model_is_identity(amount in arb_amount(), mid in arb_mid()) {
        let model = ProviderCostModel {
            provider_id: ProviderId::Wise,
            fx_spread_bps: Decimal::ZERO,
            fee: FeeSchedule::None,
            iof: IofBehavior::Fixed { pct: Decimal::ZERO },
            settlement_layers: 1,
            settlement_route: SettlementRoute::Direct,
        };
        let b = compute_breakdown(amount, mid, &model, &BreakdownOptions::new()).unwrap();
        prop_assert_eq!(b.final_amount, amount * mid);
        prop_assert_eq!(b.total_cost_amount, Decimal::ZERO);
    }

    // ===================================================================
    // INVARIANT 5: Ranking is sorted and deterministic.
    //
    // The same input always yields the same ranking, ordered by final
    // amount descending with declaration order breaking ties.
    // ===================================================================
    #[test]
    fn ranking_sorted_and_deterministic(
        amount in arb_amount(),
        mid in arb_mid(),
        regime in arb_regime(),
    ) {
        let engine = ComparisonEngine::new();
        let rates = direct_rates(mid);
        let options = ComparisonOptions::default().with_regime(regime);
        let first = engine.compare(amount, &rates, &options).unwrap();
        let second = engine.compare(amount, &rates, &options).unwrap();
        prop_assert_eq!(&first, &second);

        let finals: Vec<(ProviderId, Decimal)> = first
            .ranking
            .iter()
            .map(|id| (*id, first.outcome(*id).unwrap().breakdown.final_amount))
            .collect();
        for pair in finals.windows(2) {
            prop_assert!(
                pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0),
                "ranking out of order: {:?}",
                finals
            );
        }
        prop_assert_eq!(first.best_provider_id, first.ranking[0]);
    }

    // ===================================================================
    // INVARIANT 6: Reported cost percentage matches the amounts.
    // ===================================================================
    #[test]
    fn cost_pct_matches_amounts(
        amount in (100i64..100_000_000i64).prop_map(|c| Decimal::new(c, 2)),
        mid in arb_mid(),
        model in arb_model(),
    ) {
        let b = compute_breakdown(amount, mid, &model, &BreakdownOptions::new()).unwrap();
        let expected = b.total_cost_amount.to_f64().unwrap()
            / b.market_reference_amount.to_f64().unwrap()
            * 100.0;
        prop_assert!(relative_eq!(
            b.total_cost_pct.to_f64().unwrap(),
            expected,
            epsilon = 1e-9,
            max_relative = 1e-9
        ));
    }

    // ===================================================================
    // INVARIANT 7: An inverted quote multiplies back to one.
    // ===================================================================
    #[test]
    fn inverted_quote_round_trips(mid in arb_mid()) {
        let quote = MarketQuote::indicative(
            CurrencyPair::new(CurrencyCode::gbp(), CurrencyCode::brl()),
            mid,
        );
        let product = (quote.mid * quote.inverted().mid).to_f64().unwrap();
        prop_assert!(relative_eq!(product, 1.0, max_relative = 1e-12));
    }

    // ===================================================================
    // INVARIANT 8: A higher percentage fee never pays out more.
    // ===================================================================
    #[test]
    fn higher_percentage_fee_never_pays_more(
        amount in arb_amount(),
        mid in arb_mid(),
        spread in arb_spread(),
        iof in arb_pct(),
        a in arb_pct(),
        b in arb_pct(),
    ) {
        let (low, high) = (a.min(b), a.max(b));
        let at = |pct| {
            let model = fixed_model(spread, FeeSchedule::Percentage { pct }, iof);
            compute_breakdown(amount, mid, &model, &BreakdownOptions::new())
                .unwrap()
                .final_amount
        };
        prop_assert!(at(high) <= at(low));
    }

    // ===================================================================
    // INVARIANT 9: A higher flat fee never pays out more.
    //
    // Holds even once the fee swallows the whole transfer: IOF is never
    // charged on a negative base, so the payout keeps falling.
    // ===================================================================
    #[test]
    fn higher_flat_fee_never_pays_more(
        amount in arb_amount(),
        mid in arb_mid(),
        spread in arb_spread(),
        iof in arb_pct(),
        a in 0i64..10_000_000i64,
        b in 0i64..10_000_000i64,
    ) {
        let (low, high) = (Decimal::new(a.min(b), 2), Decimal::new(a.max(b), 2));
        let at = |fee| {
            let model = fixed_model(spread, FeeSchedule::FixedSourceCurrency { amount: fee }, iof);
            compute_breakdown(amount, mid, &model, &BreakdownOptions::new())
                .unwrap()
                .final_amount
        };
        prop_assert!(at(high) <= at(low));
    }

    // ===================================================================
    // INVARIANT 10: A higher IOF rate never pays out more.
    // ===================================================================
    #[test]
    fn higher_iof_never_pays_more(
        amount in arb_amount(),
        mid in arb_mid(),
        spread in arb_spread(),
        fee in arb_fee(),
        a in arb_pct(),
        b in arb_pct(),
    ) {
        let (low, high) = (a.min(b), a.max(b));
        let at = |iof| {
            let model = fixed_model(spread, fee.clone(), iof);
            compute_breakdown(amount, mid, &model, &BreakdownOptions::new())
                .unwrap()
                .final_amount
        };
        prop_assert!(at(high) <= at(low));
    }
}
