use crate::core::currency::CurrencyCode;
use crate::core::error::PricingError;
use crate::core::provider::ProviderId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Basis points in one whole (100%).
pub const BPS_PER_UNIT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Tax regime a transfer may qualify for.
///
/// Only two values exist at the calculator boundary. The word "variable"
/// is accepted as a synonym of `Optimized`; it is a display wording for
/// structure-dependent providers, not a third rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IofRegime {
    #[default]
    Standard,
    #[serde(alias = "variable")]
    Optimized,
}

impl fmt::Display for IofRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IofRegime::Standard => f.write_str("standard"),
            IofRegime::Optimized => f.write_str("optimized"),
        }
    }
}

impl FromStr for IofRegime {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(IofRegime::Standard),
            "optimized" | "variable" => Ok(IofRegime::Optimized),
            other => Err(PricingError::Config(format!(
                "unknown IOF regime '{}', expected standard or optimized",
                other
            ))),
        }
    }
}

/// How the applied IOF rate should be described to a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IofLabel {
    Standard,
    Optimized,
    Variable,
}

/// Explicit fee charged by a provider, one case per kind of fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeSchedule {
    /// Flat fee in the sending currency, converted at the mid rate.
    FixedSourceCurrency { amount: Decimal },
    /// Flat fee in some third currency. Converting it needs a separate
    /// `currency -> destination` reference rate.
    FixedReferenceCurrency {
        amount: Decimal,
        currency: CurrencyCode,
    },
    /// Percent (0-100) of the amount left after the FX spread.
    Percentage { pct: Decimal },
    None,
}

impl FeeSchedule {
    fn validate(&self) -> Result<(), String> {
        match self {
            FeeSchedule::FixedSourceCurrency { amount }
            | FeeSchedule::FixedReferenceCurrency { amount, .. }
                if *amount < Decimal::ZERO =>
            {
                Err(format!("flat fee {} is negative", amount))
            }
            FeeSchedule::Percentage { pct } if !is_percentage(*pct) => {
                Err(format!("fee percentage {} outside 0-100", pct))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for FeeSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeSchedule::FixedSourceCurrency { amount } => write!(f, "{} flat", amount),
            FeeSchedule::FixedReferenceCurrency { amount, currency } => {
                write!(f, "{} {} flat", amount, currency)
            }
            FeeSchedule::Percentage { pct } => write!(f, "{}%", pct),
            FeeSchedule::None => f.write_str("none"),
        }
    }
}

/// IOF tax behaviour of a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IofBehavior {
    /// Same rate whatever the regime.
    Fixed { pct: Decimal },
    /// Rate picked by the requested regime.
    RegimeDependent {
        standard_pct: Decimal,
        optimized_pct: Decimal,
    },
    /// Regime-dependent, where the optimized rate hinges on how the transfer
    /// is structured. Labelled "variable" under the optimized regime.
    StructureDependent {
        standard_pct: Decimal,
        optimized_pct: Decimal,
    },
}

impl IofBehavior {
    /// Percentage actually applied. An unspecified regime means standard.
    pub fn resolve(&self, regime: Option<IofRegime>) -> Decimal {
        match self {
            IofBehavior::Fixed { pct } => *pct,
            IofBehavior::RegimeDependent {
                standard_pct,
                optimized_pct,
            }
            | IofBehavior::StructureDependent {
                standard_pct,
                optimized_pct,
            } => match regime.unwrap_or_default() {
                IofRegime::Standard => *standard_pct,
                IofRegime::Optimized => *optimized_pct,
            },
        }
    }

    pub fn label(&self, regime: Option<IofRegime>) -> IofLabel {
        match (self, regime.unwrap_or_default()) {
            (IofBehavior::StructureDependent { .. }, IofRegime::Optimized) => IofLabel::Variable,
            (IofBehavior::Fixed { .. }, _) | (_, IofRegime::Standard) => IofLabel::Standard,
            (_, IofRegime::Optimized) => IofLabel::Optimized,
        }
    }

    pub fn is_regime_dependent(&self) -> bool {
        !matches!(self, IofBehavior::Fixed { .. })
    }

    fn validate(&self) -> Result<(), String> {
        let pcts = match self {
            IofBehavior::Fixed { pct } => vec![*pct],
            IofBehavior::RegimeDependent {
                standard_pct,
                optimized_pct,
            }
            | IofBehavior::StructureDependent {
                standard_pct,
                optimized_pct,
            } => vec![*standard_pct, *optimized_pct],
        };
        match pcts.into_iter().find(|p| !is_percentage(*p)) {
            Some(bad) => Err(format!("IOF percentage {} outside 0-100", bad)),
            None => Ok(()),
        }
    }
}

impl fmt::Display for IofBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IofBehavior::Fixed { pct } => write!(f, "{}%", pct),
            IofBehavior::RegimeDependent {
                standard_pct,
                optimized_pct,
            } => write!(f, "{}% / {}% optimized", standard_pct, optimized_pct),
            IofBehavior::StructureDependent {
                standard_pct,
                optimized_pct,
            } => write!(f, "{}% / {}% variable", standard_pct, optimized_pct),
        }
    }
}

/// The intermediate leg a provider settles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementRoute {
    /// Source -> destination, one conversion.
    Direct,
    /// Source -> USD -> destination (correspondent banking).
    ViaUsd,
    /// Source -> USDT -> destination (stablecoin rail).
    ViaStablecoin,
}

impl SettlementRoute {
    /// Currencies visited from `source` to `destination`.
    pub fn path(&self, source: &CurrencyCode, destination: &CurrencyCode) -> Vec<CurrencyCode> {
        match self {
            SettlementRoute::Direct => vec![source.clone(), destination.clone()],
            SettlementRoute::ViaUsd => {
                vec![source.clone(), CurrencyCode::usd(), destination.clone()]
            }
            SettlementRoute::ViaStablecoin => {
                vec![source.clone(), CurrencyCode::usdt(), destination.clone()]
            }
        }
    }
}

/// Static cost configuration of one provider.
///
/// Percentages are on a 0-100 scale; the calculator converts to fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCostModel {
    pub provider_id: ProviderId,
    /// FX markup against mid, in basis points.
    pub fx_spread_bps: Decimal,
    pub fee: FeeSchedule,
    pub iof: IofBehavior,
    /// Intermediaries the money passes through. Display only.
    pub settlement_layers: u32,
    pub settlement_route: SettlementRoute,
}

impl ProviderCostModel {
    /// Check the model's own invariants.
    pub fn validate(&self) -> Result<(), PricingError> {
        let invalid = |reason: String| PricingError::InvalidModel {
            provider: self.provider_id,
            reason,
        };
        if self.fx_spread_bps < Decimal::ZERO || self.fx_spread_bps > BPS_PER_UNIT {
            return Err(invalid(format!(
                "spread {} bps outside 0-10000",
                self.fx_spread_bps
            )));
        }
        if self.settlement_layers == 0 {
            return Err(invalid("settlement_layers must be at least 1".to_string()));
        }
        self.fee.validate().map_err(invalid)?;
        self.iof.validate().map_err(invalid)?;
        Ok(())
    }
}

fn is_percentage(pct: Decimal) -> bool {
    pct >= Decimal::ZERO && pct <= Decimal::ONE_HUNDRED
}
