use crate::core::currency::CurrencyCode;
use crate::core::error::PricingError;
use crate::core::provider::ProviderId;
use crate::core::quote::PricingMode;
use crate::core::rates::{RateSource, RouteQuote};
use crate::pricing::calculator::{compute_breakdown, BreakdownOptions, CostBreakdown};
use crate::pricing::model::{FeeSchedule, IofRegime, ProviderCostModel, BPS_PER_UNIT};
use crate::pricing::registry::ProviderRegistry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Shared input for one comparison run.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOptions {
    pub source: CurrencyCode,
    pub destination: CurrencyCode,
    pub regime: Option<IofRegime>,
    /// Side of each quote the settlement legs execute at.
    pub pricing_mode: PricingMode,
    /// Per-provider spread what-ifs.
    pub spread_overrides: HashMap<ProviderId, Decimal>,
}

impl Default for ComparisonOptions {
    /// GBP to BRL at the mid under the standard regime.
    fn default() -> Self {
        Self {
            source: CurrencyCode::gbp(),
            destination: CurrencyCode::brl(),
            regime: None,
            pricing_mode: PricingMode::Indicative,
            spread_overrides: HashMap::new(),
        }
    }
}

impl ComparisonOptions {
    pub fn new(source: CurrencyCode, destination: CurrencyCode) -> Self {
        Self {
            source,
            destination,
            ..Default::default()
        }
    }

    pub fn with_regime(mut self, regime: IofRegime) -> Self {
        self.regime = Some(regime);
        self
    }

    pub fn with_pricing_mode(mut self, mode: PricingMode) -> Self {
        self.pricing_mode = mode;
        self
    }

    pub fn with_spread_override(mut self, provider: ProviderId, bps: Decimal) -> Self {
        self.spread_overrides.insert(provider, bps);
        self
    }
}

/// Result for one provider inside a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider_id: ProviderId,
    pub settlement_layers: u32,
    /// How the rate used for this provider was composed.
    pub route: RouteQuote,
    pub breakdown: CostBreakdown,
}

/// Display hint for the savings figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsLabel {
    /// The best provider beats both references.
    Savings,
    /// At least one reference pays out more; show a neutral difference.
    Difference,
}

/// All providers priced against the same input, ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub source_amount: Decimal,
    pub source: CurrencyCode,
    pub destination: CurrencyCode,
    pub pricing_mode: PricingMode,
    /// One outcome per provider, in declaration order.
    pub models: Vec<ProviderOutcome>,
    /// Provider ids by final amount, best first. Ties keep declaration order.
    pub ranking: Vec<ProviderId>,
    pub best_provider_id: ProviderId,
    /// Best final amount minus the bank's.
    pub savings_vs_bank: Decimal,
    /// Best final amount minus Wise's, the other established competitor.
    pub savings_vs_other_provider: Decimal,
    pub savings_label_kind: SavingsLabel,
}

impl ComparisonResult {
    pub fn outcome(&self, id: ProviderId) -> Option<&ProviderOutcome> {
        self.models.iter().find(|m| m.provider_id == id)
    }

    pub fn best(&self) -> Option<&ProviderOutcome> {
        self.outcome(self.best_provider_id)
    }

    /// Best final amount minus `id`'s final amount, `None` when `id` was not
    /// part of the comparison.
    pub fn savings_vs(&self, id: ProviderId) -> Option<Decimal> {
        let best = self.best()?.breakdown.final_amount;
        self.outcome(id).map(|o| best - o.breakdown.final_amount)
    }

    /// Savings against `id` in bps of `id`'s reference amount.
    pub fn delta_bps_vs(&self, id: ProviderId) -> Option<Decimal> {
        let savings = self.savings_vs(id)?;
        let reference = self.outcome(id)?.breakdown.market_reference_amount;
        if reference.is_zero() {
            return Some(Decimal::ZERO);
        }
        Some(savings / reference * BPS_PER_UNIT)
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Provider Comparison ===")?;
        writeln!(
            f,
            "Send:            {} {} -> {}",
            self.source_amount, self.source, self.destination
        )?;
        writeln!(f, "Pricing:         {}", self.pricing_mode)?;
        for (rank, id) in self.ranking.iter().enumerate() {
            if let Some(outcome) = self.outcome(*id) {
                let b = &outcome.breakdown;
                writeln!(
                    f,
                    "{}. {:<18} receives {:>14.2} {}  cost {:>6.2}%  rate {:.4} ({}, {} layer(s))",
                    rank + 1,
                    id.display_name(),
                    b.final_amount,
                    self.destination,
                    b.total_cost_pct,
                    outcome.route.effective_rate,
                    outcome.route.confidence,
                    outcome.settlement_layers
                )?;
            }
        }
        let label = match self.savings_label_kind {
            SavingsLabel::Savings => "Savings",
            SavingsLabel::Difference => "Difference",
        };
        writeln!(f, "Best:            {}", self.best_provider_id.display_name())?;
        writeln!(f, "{} vs bank:  {:.2}", label, self.savings_vs_bank)?;
        writeln!(f, "{} vs wise:  {:.2}", label, self.savings_vs_other_provider)?;
        Ok(())
    }
}

/// Runs the calculator for every registered provider and ranks them.
#[derive(Debug, Clone, Default)]
pub struct ComparisonEngine {
    registry: ProviderRegistry,
}

impl ComparisonEngine {
    /// Engine over the canonical provider table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Price `source_amount` with every provider.
    ///
    /// Each provider gets its own mid rate, composed along its settlement
    /// route from `rates`. Any failure (missing rate, dead feed, bad input)
    /// aborts the whole comparison; a provider is never silently dropped.
    pub fn compare(
        &self,
        source_amount: Decimal,
        rates: &dyn RateSource,
        options: &ComparisonOptions,
    ) -> Result<ComparisonResult, PricingError> {
        let mut models = Vec::with_capacity(self.registry.len());
        for model in self.registry.iter() {
            models.push(self.price_provider(model, source_amount, rates, options)?);
        }

        let mut ranked: Vec<(ProviderId, Decimal)> = models
            .iter()
            .map(|m| (m.provider_id, m.breakdown.final_amount))
            .collect();
        // Descending by payout, then declaration order on ties.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let ranking: Vec<ProviderId> = ranked.iter().map(|(id, _)| *id).collect();
        let (best_provider_id, best_amount) = ranked[0];

        let final_of = |id: ProviderId| -> Result<Decimal, PricingError> {
            models
                .iter()
                .find(|m| m.provider_id == id)
                .map(|m| m.breakdown.final_amount)
                .ok_or_else(|| PricingError::UnknownProvider(id.to_string()))
        };
        let savings_vs_bank = best_amount - final_of(ProviderId::Bank)?;
        let savings_vs_other_provider = best_amount - final_of(ProviderId::Wise)?;
        let savings_label_kind =
            if savings_vs_bank >= Decimal::ZERO && savings_vs_other_provider >= Decimal::ZERO {
                SavingsLabel::Savings
            } else {
                SavingsLabel::Difference
            };

        log::debug!(
            "compared {} providers for {} {}: best={} ({})",
            models.len(),
            source_amount,
            options.source,
            best_provider_id,
            best_amount
        );

        Ok(ComparisonResult {
            source_amount,
            source: options.source.clone(),
            destination: options.destination.clone(),
            pricing_mode: options.pricing_mode,
            models,
            ranking,
            best_provider_id,
            savings_vs_bank,
            savings_vs_other_provider,
            savings_label_kind,
        })
    }

    fn price_provider(
        &self,
        model: &ProviderCostModel,
        source_amount: Decimal,
        rates: &dyn RateSource,
        options: &ComparisonOptions,
    ) -> Result<ProviderOutcome, PricingError> {
        let path = model
            .settlement_route
            .path(&options.source, &options.destination);
        let route = RouteQuote::compose_with_mode(rates, &path, options.pricing_mode)?;

        let mut breakdown_options = BreakdownOptions {
            regime: options.regime,
            spread_override_bps: options.spread_overrides.get(&model.provider_id).copied(),
            reference_rate: None,
        };
        if let FeeSchedule::FixedReferenceCurrency { currency, .. } = &model.fee {
            let fee_route = RouteQuote::compose_with_mode(
                rates,
                &[currency.clone(), options.destination.clone()],
                options.pricing_mode,
            )?;
            breakdown_options.reference_rate = Some(fee_route.effective_rate);
        }

        let breakdown = compute_breakdown(
            source_amount,
            route.effective_rate,
            model,
            &breakdown_options,
        )?;

        Ok(ProviderOutcome {
            provider_id: model.provider_id,
            settlement_layers: model.settlement_layers,
            route,
            breakdown,
        })
    }
}

/// Compare every canonical provider for one input.
///
/// # Examples
///
/// ```
/// use remit_pricing::core::currency::CurrencyCode;
/// use remit_pricing::core::provider::ProviderId;
/// use remit_pricing::core::rates::FxRateTable;
/// use remit_pricing::pricing::comparison::{compare_providers, ComparisonOptions};
/// use rust_decimal_macros::dec;
///
/// let mut rates = FxRateTable::new();
/// rates.set_mid(CurrencyCode::gbp(), CurrencyCode::usd(), dec!(1.27)).unwrap();
/// rates.set_mid(CurrencyCode::usd(), CurrencyCode::brl(), dec!(5.19)).unwrap();
/// rates.set_mid(CurrencyCode::gbp(), CurrencyCode::usdt(), dec!(1.27)).unwrap();
/// rates.set_mid(CurrencyCode::usdt(), CurrencyCode::brl(), dec!(5.19)).unwrap();
///
/// let result = compare_providers(dec!(10_000), &rates, &ComparisonOptions::default()).unwrap();
/// assert_eq!(result.best_provider_id, ProviderId::Coins);
/// ```
pub fn compare_providers(
    source_amount: Decimal,
    rates: &dyn RateSource,
    options: &ComparisonOptions,
) -> Result<ComparisonResult, PricingError> {
    ComparisonEngine::new().compare(source_amount, rates, options)
}
