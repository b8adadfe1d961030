use crate::core::error::PricingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a money-transfer provider being compared.
///
/// The set is closed. Declaration order (bank, wise, coins) is the canonical
/// display order and the tie-break order when two providers pay out the
/// same amount, which is why `Ord` is derived.
///
/// # Examples
///
/// ```
/// use remit_pricing::core::provider::ProviderId;
///
/// let coins: ProviderId = "coins".parse().unwrap();
/// assert_eq!(coins, ProviderId::Coins);
/// assert!(ProviderId::Bank < ProviderId::Wise);
/// assert!("western-union".parse::<ProviderId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Bank,
    Wise,
    Coins,
}

impl ProviderId {
    /// Every provider, in declaration order.
    pub const ALL: [ProviderId; 3] = [ProviderId::Bank, ProviderId::Wise, ProviderId::Coins];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Bank => "bank",
            ProviderId::Wise => "wise",
            ProviderId::Coins => "coins",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Bank => "Traditional Bank",
            ProviderId::Wise => "Wise",
            ProviderId::Coins => "Coins",
        }
    }

    /// Position in declaration order.
    pub fn declaration_index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bank" => Ok(ProviderId::Bank),
            "wise" => Ok(ProviderId::Wise),
            "coins" => Ok(ProviderId::Coins),
            _ => Err(PricingError::UnknownProvider(s.to_string())),
        }
    }
}
