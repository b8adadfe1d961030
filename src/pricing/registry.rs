use crate::core::error::PricingError;
use crate::core::provider::ProviderId;
use crate::pricing::model::{FeeSchedule, IofBehavior, ProviderCostModel, SettlementRoute};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The set of provider cost models the engine compares.
///
/// Holds exactly one model per [`ProviderId`], iterated in declaration
/// order. Built once and never mutated.
///
/// # Examples
///
/// ```
/// use remit_pricing::core::provider::ProviderId;
/// use remit_pricing::pricing::registry::ProviderRegistry;
/// use rust_decimal_macros::dec;
///
/// let registry = ProviderRegistry::canonical();
/// let bank = registry.get(ProviderId::Bank).unwrap();
/// assert_eq!(bank.fx_spread_bps, dec!(250));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRegistry {
    providers: Vec<ProviderCostModel>,
}

/// On-disk layout of an alternate provider table.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    providers: Vec<ProviderCostModel>,
}

impl ProviderRegistry {
    /// The canonical provider table.
    ///
    /// Bank: 250 bps markup, 0.8% fee, flat 3.5% IOF, four layers via USD.
    /// Wise: 50 bps, 0.89% fee, 3.5% or 1.1% IOF by regime, two layers via USD.
    /// Coins: 15 bps, 0.30% fee, 3.5% or 0.38% IOF depending on structure,
    /// one layer over the USDT rail.
    pub fn canonical() -> Self {
        Self {
            providers: vec![
                ProviderCostModel {
                    provider_id: ProviderId::Bank,
                    fx_spread_bps: dec!(250),
                    fee: FeeSchedule::Percentage { pct: dec!(0.8) },
                    iof: IofBehavior::Fixed { pct: dec!(3.5) },
                    settlement_layers: 4,
                    settlement_route: SettlementRoute::ViaUsd,
                },
                ProviderCostModel {
                    provider_id: ProviderId::Wise,
                    fx_spread_bps: dec!(50),
                    fee: FeeSchedule::Percentage { pct: dec!(0.89) },
                    iof: IofBehavior::RegimeDependent {
                        standard_pct: dec!(3.5),
                        optimized_pct: dec!(1.1),
                    },
                    settlement_layers: 2,
                    settlement_route: SettlementRoute::ViaUsd,
                },
                ProviderCostModel {
                    provider_id: ProviderId::Coins,
                    fx_spread_bps: dec!(15),
                    fee: FeeSchedule::Percentage { pct: dec!(0.30) },
                    iof: IofBehavior::StructureDependent {
                        standard_pct: dec!(3.5),
                        optimized_pct: dec!(0.38),
                    },
                    settlement_layers: 1,
                    settlement_route: SettlementRoute::ViaStablecoin,
                },
            ],
        }
    }

    /// Build a registry from arbitrary models.
    ///
    /// Every model must pass its own validation, and each provider must
    /// appear exactly once. Models are reordered into declaration order.
    pub fn new(mut providers: Vec<ProviderCostModel>) -> Result<Self, PricingError> {
        for model in &providers {
            model.validate()?;
        }
        providers.sort_by_key(|m| m.provider_id);
        for pair in providers.windows(2) {
            if pair[0].provider_id == pair[1].provider_id {
                return Err(PricingError::InvalidModel {
                    provider: pair[0].provider_id,
                    reason: "declared more than once".to_string(),
                });
            }
        }
        if let Some(missing) = ProviderId::ALL
            .iter()
            .find(|id| !providers.iter().any(|m| m.provider_id == **id))
        {
            return Err(PricingError::InvalidModel {
                provider: *missing,
                reason: "no cost model declared".to_string(),
            });
        }
        Ok(Self { providers })
    }

    /// Load a table from JSON of the form `{ "providers": [ ... ] }`.
    pub fn from_json(json: &str) -> Result<Self, PricingError> {
        let file: RegistryFile = serde_json::from_str(json)?;
        let registry = Self::new(file.providers)?;
        log::debug!("loaded provider registry with {} models", registry.len());
        Ok(registry)
    }

    pub fn get(&self, id: ProviderId) -> Result<&ProviderCostModel, PricingError> {
        self.providers
            .iter()
            .find(|m| m.provider_id == id)
            .ok_or_else(|| PricingError::UnknownProvider(id.to_string()))
    }

    /// Lookup by the string form of an id, as it arrives from a caller.
    pub fn get_by_name(&self, name: &str) -> Result<&ProviderCostModel, PricingError> {
        let id: ProviderId = name.parse()?;
        self.get(id)
    }

    /// Models in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProviderCostModel> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::canonical()
    }
}
