//! Subscription state resolution
//!
//! The payment processor is the source of truth. [`SubscriptionService::check`]
//! queries it, persists the result keyed by email, and refreshes the
//! in-process tier cache that every quota decision reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tracing::{debug, info, instrument};

use histoires_db::{SubscriberRepository, UpsertSubscriber};
use histoires_types::{
    CheckoutSession, PortalSession, PriceId, SubscriptionState, Tier, UserId,
};

use crate::{BillingConfig, BillingError, PaymentProvider};

/// Subscription service with tier caching
#[derive(Clone)]
pub struct SubscriptionService {
    provider: Arc<dyn PaymentProvider>,
    subscribers: Arc<dyn SubscriberRepository>,
    config: BillingConfig,
    /// Cache of user_id -> tier
    tier_cache: Cache<UserId, Tier>,
}

impl SubscriptionService {
    /// Create a new subscription service
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        subscribers: Arc<dyn SubscriberRepository>,
        config: BillingConfig,
    ) -> Self {
        let tier_cache = Cache::builder()
            .time_to_live(config.tier_cache_ttl)
            .max_capacity(10_000)
            .build();
        Self {
            provider,
            subscribers,
            config,
            tier_cache,
        }
    }

    /// Resolve the subscription from the payment processor and persist it
    #[instrument(skip(self, email), fields(user_id = %user_id))]
    pub async fn check(&self, user_id: &UserId, email: &str) -> Result<SubscriptionState, BillingError> {
        let customer_id = self.provider.find_customer_by_email(email).await?;

        let Some(customer_id) = customer_id else {
            debug!("No customer, user is on the free tier");
            let state = self
                .subscribers
                .upsert(UpsertSubscriber {
                    email: email.to_string(),
                    user_id: Some(user_id.0),
                    subscribed: false,
                    subscription_tier: None,
                    subscription_end: None,
                    stripe_customer_id: None,
                })
                .await?
                .into_state();
            self.tier_cache.insert(*user_id, Tier::Free).await;
            return Ok(state);
        };

        let active = self.provider.find_active_subscription(&customer_id).await?;
        let (subscribed, tier, subscription_end) = match &active {
            Some(sub) => (
                true,
                Some(Tier::from_unit_amount(sub.unit_amount.unwrap_or(0))),
                sub.current_period_end
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            ),
            None => (false, None, None),
        };

        let state = self
            .subscribers
            .upsert(UpsertSubscriber {
                email: email.to_string(),
                user_id: Some(user_id.0),
                subscribed,
                subscription_tier: tier.map(|t| t.to_string()),
                subscription_end,
                stripe_customer_id: Some(customer_id.0.clone()),
            })
            .await?
            .into_state();

        info!(subscribed, tier = ?tier, "Subscription state refreshed");
        self.tier_cache
            .insert(*user_id, state.effective_tier())
            .await;

        Ok(state)
    }

    /// The last persisted state, without calling the payment processor
    pub async fn cached_state(&self, user_id: &UserId) -> Result<Option<SubscriptionState>, BillingError> {
        Ok(self
            .subscribers
            .find_by_user_id(user_id.0)
            .await?
            .map(|row| row.into_state()))
    }

    /// Effective tier of a user
    ///
    /// Reads the in-process cache, then the persisted state. Users never
    /// checked are on the free tier.
    pub async fn tier(&self, user_id: &UserId) -> Result<Tier, BillingError> {
        if let Some(tier) = self.tier_cache.get(user_id).await {
            return Ok(tier);
        }

        let tier = self
            .cached_state(user_id)
            .await?
            .map(|state| state.effective_tier())
            .unwrap_or(Tier::Free);

        self.tier_cache.insert(*user_id, tier).await;
        Ok(tier)
    }

    /// Drop a user's cached tier
    pub async fn invalidate(&self, user_id: &UserId) {
        self.tier_cache.invalidate(user_id).await;
    }

    /// Start a subscription checkout, creating the customer if needed
    #[instrument(skip(self, email))]
    pub async fn checkout(
        &self,
        email: &str,
        price_id: Option<PriceId>,
    ) -> Result<CheckoutSession, BillingError> {
        let price_id = price_id
            .or_else(|| self.config.default_price_id.clone())
            .ok_or(BillingError::MissingPrice)?;

        let customer_id = match self.provider.find_customer_by_email(email).await? {
            Some(id) => id,
            None => self.provider.create_customer(email).await?,
        };

        self.provider
            .create_checkout_session(
                &customer_id,
                &price_id,
                &self.config.success_url,
                &self.config.cancel_url,
            )
            .await
    }

    /// Open the billing portal of an existing customer
    #[instrument(skip(self, email))]
    pub async fn portal(&self, email: &str) -> Result<PortalSession, BillingError> {
        let customer_id = self
            .provider
            .find_customer_by_email(email)
            .await?
            .ok_or(BillingError::CustomerNotFound)?;

        self.provider
            .create_portal_session(&customer_id, &self.config.portal_return_url)
            .await
    }
}

impl std::fmt::Debug for SubscriptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
