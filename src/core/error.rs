use crate::core::currency::{CurrencyCode, FxError};
use crate::core::provider::ProviderId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned by the pricing engine.
///
/// Invalid numeric input is always reported, never coerced to zero, so a
/// caller can tell "the rate feed is down" apart from "you sent nothing".
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid {field}: {value} ({reason})")]
    InvalidInput {
        field: &'static str,
        value: Decimal,
        reason: &'static str,
    },
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
    #[error("fee in {currency} needs a {currency} -> destination reference rate")]
    MissingReferenceRate { currency: CurrencyCode },
    #[error("invalid cost model for {provider}: {reason}")]
    InvalidModel {
        provider: ProviderId,
        reason: String,
    },
    #[error(transparent)]
    Rate(#[from] FxError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PricingError {
    pub(crate) fn invalid(field: &'static str, value: Decimal, reason: &'static str) -> Self {
        PricingError::InvalidInput {
            field,
            value,
            reason,
        }
    }

    /// True for errors caused by bad configuration rather than bad input.
    /// These should fail loudly in development.
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            PricingError::UnknownProvider(_)
                | PricingError::InvalidModel { .. }
                | PricingError::Config(_)
        )
    }
}

/// Non-fatal conditions attached to an otherwise valid breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingWarning {
    /// The reference amount is zero, so cost percentages are reported as 0.
    DegenerateResult,
    /// Costs exceed the reference amount; the payout is negative.
    NegativePayout { final_amount: Decimal },
}

impl fmt::Display for PricingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingWarning::DegenerateResult => {
                write!(f, "reference amount is zero; cost percentage reported as 0")
            }
            PricingWarning::NegativePayout { final_amount } => {
                write!(f, "costs exceed the transfer, payout is {}", final_amount)
            }
        }
    }
}
