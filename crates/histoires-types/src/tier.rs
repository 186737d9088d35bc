//! Subscription tier types

use serde::{Deserialize, Serialize};

use crate::TypeError;

/// Subscription tier levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No active subscription
    Free,
    /// Entry paid plan, up to 9.99/month
    Basic,
    /// Main paid plan, up to 19.99/month
    Premium,
    /// Anything priced above Premium
    Enterprise,
}

/// Upper bound (inclusive, in cents) of the Basic price band
pub const BASIC_MAX_UNIT_AMOUNT: i64 = 999;

/// Upper bound (inclusive, in cents) of the Premium price band
pub const PREMIUM_MAX_UNIT_AMOUNT: i64 = 1_999;

impl Tier {
    /// All tiers, cheapest first
    pub const ALL: [Tier; 4] = [Self::Free, Self::Basic, Self::Premium, Self::Enterprise];

    /// Map a recurring price amount (in cents) to the paid tier it buys.
    pub const fn from_unit_amount(amount_cents: i64) -> Self {
        if amount_cents <= BASIC_MAX_UNIT_AMOUNT {
            Self::Basic
        } else if amount_cents <= PREMIUM_MAX_UNIT_AMOUNT {
            Self::Premium
        } else {
            Self::Enterprise
        }
    }

    /// Whether this tier is a paid plan
    pub const fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Display label shown to customers
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Free => "Gratuit",
            Self::Basic => "Basic",
            Self::Premium => "Premium",
            Self::Enterprise => "Enterprise",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Basic => write!(f, "basic"),
            Self::Premium => write!(f, "premium"),
            Self::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" | "gratuit" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(TypeError::InvalidTier(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_thresholds() {
        assert_eq!(Tier::from_unit_amount(499), Tier::Basic);
        assert_eq!(Tier::from_unit_amount(999), Tier::Basic);
        assert_eq!(Tier::from_unit_amount(1_000), Tier::Premium);
        assert_eq!(Tier::from_unit_amount(1_999), Tier::Premium);
        assert_eq!(Tier::from_unit_amount(2_000), Tier::Enterprise);
    }

    #[test]
    fn test_parse_roundtrips_display() {
        for tier in Tier::ALL {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert_eq!("Premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_only_free_is_unpaid() {
        assert!(!Tier::Free.is_paid());
        assert!(Tier::Basic.is_paid());
        assert!(Tier::Enterprise.is_paid());
    }
}
