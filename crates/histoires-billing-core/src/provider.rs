//! Payment provider abstraction

use async_trait::async_trait;

use histoires_types::{CheckoutSession, CustomerId, PriceId, PortalSession};

use crate::BillingError;

/// The active subscription of a customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSubscription {
    /// Subscription ID
    pub id: String,
    /// Recurring price in cents, when the provider reports one
    pub unit_amount: Option<i64>,
    /// End of the current period (Unix timestamp)
    pub current_period_end: Option<i64>,
}

/// Payment provider trait
///
/// Abstracts payment processing to allow different providers (Stripe, etc.)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Look up a customer by email
    async fn find_customer_by_email(&self, email: &str)
        -> Result<Option<CustomerId>, BillingError>;

    /// Create a customer
    async fn create_customer(&self, email: &str) -> Result<CustomerId, BillingError>;

    /// Create a subscription-mode checkout session
    async fn create_checkout_session(
        &self,
        customer_id: &CustomerId,
        price_id: &PriceId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError>;

    /// Create a customer portal session
    async fn create_portal_session(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> Result<PortalSession, BillingError>;

    /// The customer's active subscription, if any
    async fn find_active_subscription(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<ActiveSubscription>, BillingError>;
}
