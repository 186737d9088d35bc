//! Subscription types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CustomerId, Tier, UserId};

/// Resolved subscription state of a user, cached per email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    pub email: String,
    pub user_id: Option<UserId>,
    /// Whether the user has an active paid subscription
    pub subscribed: bool,
    /// Paid tier when subscribed
    pub tier: Option<Tier>,
    /// Renewal or end date of the current period
    pub subscription_end: Option<DateTime<Utc>>,
    /// Payment-processor customer reference
    pub customer_id: Option<CustomerId>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionState {
    /// State of a user without any subscription
    pub fn free(email: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            email: email.into(),
            user_id,
            subscribed: false,
            tier: None,
            subscription_end: None,
            customer_id: None,
            updated_at: Utc::now(),
        }
    }

    /// The tier whose limits apply
    pub fn effective_tier(&self) -> Tier {
        if self.subscribed {
            self.tier.unwrap_or(Tier::Premium)
        } else {
            Tier::Free
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribed_is_free_even_with_stale_tier() {
        let mut state = SubscriptionState::free("a@b.c", None);
        state.tier = Some(Tier::Premium);
        assert_eq!(state.effective_tier(), Tier::Free);
    }

    #[test]
    fn test_subscribed_uses_tier() {
        let mut state = SubscriptionState::free("a@b.c", None);
        state.subscribed = true;
        state.tier = Some(Tier::Basic);
        assert_eq!(state.effective_tier(), Tier::Basic);
    }
}
