//! # remit-pricing
//!
//! Cost decomposition and comparison engine for cross-border remittances.
//!
//! Given a send amount and a mid-market rate, this engine breaks a
//! provider's price down into FX spread, explicit fee and IOF tax, and
//! ranks a traditional bank, Wise and Coins by what the recipient ends up
//! with.
//!
//! ## Architecture
//!
//! - **core**: Currencies, quotes, rate sources, provider ids, errors
//! - **pricing**: Provider cost models, the calculator and the comparison engine
//! - **simulation**: Amount sweeps, break-even search, spread and FX shock scenarios

pub mod core;
pub mod pricing;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::currency::{CurrencyCode, CurrencyPair};
    pub use crate::core::error::{PricingError, PricingWarning};
    pub use crate::core::provider::ProviderId;
    pub use crate::core::quote::{Confidence, MarketQuote, PricingMode};
    pub use crate::core::rates::{FxRateTable, RateSource, RouteQuote};
    pub use crate::pricing::calculator::{compute_breakdown, BreakdownOptions, CostBreakdown};
    pub use crate::pricing::comparison::{
        compare_providers, ComparisonEngine, ComparisonOptions, ComparisonResult,
    };
    pub use crate::pricing::model::{FeeSchedule, IofBehavior, IofRegime, ProviderCostModel};
    pub use crate::pricing::registry::ProviderRegistry;
}
