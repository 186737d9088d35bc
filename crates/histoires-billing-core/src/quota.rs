//! Usage quota gate
//!
//! Every metered action goes through [`QuotaGate`]. Counters are keyed by
//! user and calendar month, and the check and increment happen in a single
//! conditional upsert, so concurrent requests cannot overshoot a limit.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use histoires_db::UsageRepository;
use histoires_types::{
    usage_period, Limit, Tier, UsageAction, UsageCounters, UsageLimits, UsageSnapshot, UserId,
};

use crate::BillingError;

/// Quota gate over the usage counters
#[derive(Clone)]
pub struct QuotaGate {
    usage: Arc<dyn UsageRepository>,
    limits: UsageLimits,
}

impl QuotaGate {
    /// Create a gate with the given limit table
    pub fn new(usage: Arc<dyn UsageRepository>, limits: UsageLimits) -> Self {
        Self { usage, limits }
    }

    /// The limit table
    pub fn limits(&self) -> &UsageLimits {
        &self.limits
    }

    /// Current counters and limits of a user
    pub async fn snapshot(&self, user_id: &UserId, tier: Tier) -> Result<UsageSnapshot, BillingError> {
        let period = usage_period(Utc::now());
        let counters = self
            .usage
            .get(user_id.0, &period)
            .await?
            .map(|row| row.counters())
            .unwrap_or_default();

        Ok(UsageSnapshot {
            period,
            tier,
            counters,
            limits: self.limits.for_tier(tier),
        })
    }

    /// Fail if the action is not currently allowed, without counting it
    pub async fn ensure_allowed(
        &self,
        user_id: &UserId,
        tier: Tier,
        action: UsageAction,
    ) -> Result<UsageSnapshot, BillingError> {
        let snapshot = self.snapshot(user_id, tier).await?;
        match snapshot.limits.get(action) {
            Limit::Limited(limit) if !snapshot.can(action) => {
                Err(BillingError::UsageLimitExceeded {
                    action,
                    current: snapshot.counters.get(action),
                    limit,
                })
            }
            _ => Ok(snapshot),
        }
    }

    /// Count one action, failing if the limit is already reached
    ///
    /// Unlimited actions are not counted. Returns the counters after the
    /// increment (or the current ones when nothing was counted).
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn consume(
        &self,
        user_id: &UserId,
        tier: Tier,
        action: UsageAction,
    ) -> Result<UsageCounters, BillingError> {
        let limit = match self.limits.for_tier(tier).get(action) {
            Limit::Unlimited => {
                debug!(%action, "Unlimited action, not counted");
                return Ok(self.snapshot(user_id, tier).await?.counters);
            }
            Limit::Limited(limit) => limit,
        };

        let period = usage_period(Utc::now());
        match self
            .usage
            .try_increment(user_id.0, &period, action, Some(limit))
            .await?
        {
            Some(row) => {
                debug!(%action, "Usage counted");
                Ok(row.counters())
            }
            None => Err(BillingError::UsageLimitExceeded {
                action,
                current: limit,
                limit,
            }),
        }
    }
}

impl std::fmt::Debug for QuotaGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGate")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
