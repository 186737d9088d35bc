//! Stripe payment provider implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use histoires_types::{CheckoutSession, CustomerId, PortalSession, PriceId};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{ActiveSubscription, PaymentProvider};

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: BillingConfig,
}

/// Request payload of a Stripe call
enum Payload<'a> {
    Query(&'a [(&'a str, &'a str)]),
    Form(&'a [(&'a str, &'a str)]),
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: BillingConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    /// Make authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        payload: Payload<'_>,
    ) -> Result<T, BillingError> {
        let key = self
            .config
            .stripe_secret_key
            .as_deref()
            .ok_or(BillingError::MissingApiKey)?;
        let url = format!("{}{endpoint}", self.config.api_base);

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(key, Option::<&str>::None);

        request = match payload {
            Payload::Query(query) => request.query(query),
            Payload::Form(form) => request.form(form),
        };

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            BillingError::ProviderError(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Stripe API error");
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("Stripe API error: {status}"));
            return Err(BillingError::ProviderError(message));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Internal(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, email))]
    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerId>, BillingError> {
        debug!("Looking up Stripe customer");

        let query = [("email", email), ("limit", "1")];
        let customers: StripeList<StripeCustomer> = self
            .stripe_request(reqwest::Method::GET, "/customers", Payload::Query(&query))
            .await?;

        Ok(customers
            .data
            .into_iter()
            .find(|c| !c.deleted)
            .map(|c| CustomerId(c.id)))
    }

    #[instrument(skip(self, email))]
    async fn create_customer(&self, email: &str) -> Result<CustomerId, BillingError> {
        debug!("Creating Stripe customer");

        let form = [("email", email)];
        let customer: StripeCustomer = self
            .stripe_request(reqwest::Method::POST, "/customers", Payload::Form(&form))
            .await?;

        Ok(CustomerId(customer.id))
    }

    #[instrument(skip(self))]
    async fn create_checkout_session(
        &self,
        customer_id: &CustomerId,
        price_id: &PriceId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        debug!(customer_id = %customer_id, price_id = %price_id, "Creating checkout session");

        let form = [
            ("customer", customer_id.as_str()),
            ("mode", "subscription"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("line_items[0][price]", price_id.as_str()),
            ("line_items[0][quantity]", "1"),
        ];

        let session: StripeCheckoutSession = self
            .stripe_request(
                reqwest::Method::POST,
                "/checkout/sessions",
                Payload::Form(&form),
            )
            .await?;

        let url = session
            .url
            .ok_or_else(|| BillingError::ProviderError("checkout session has no URL".to_string()))?;

        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        debug!(customer_id = %customer_id, "Creating portal session");

        let form = [("customer", customer_id.as_str()), ("return_url", return_url)];

        let session: StripeBillingPortalSession = self
            .stripe_request(
                reqwest::Method::POST,
                "/billing_portal/sessions",
                Payload::Form(&form),
            )
            .await?;

        Ok(PortalSession { url: session.url })
    }

    #[instrument(skip(self))]
    async fn find_active_subscription(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<ActiveSubscription>, BillingError> {
        debug!(customer_id = %customer_id, "Listing active subscriptions");

        let query = [
            ("customer", customer_id.as_str()),
            ("status", "active"),
            ("limit", "1"),
        ];
        let subscriptions: StripeList<StripeSubscription> = self
            .stripe_request(
                reqwest::Method::GET,
                "/subscriptions",
                Payload::Query(&query),
            )
            .await?;

        Ok(subscriptions.data.into_iter().next().map(|sub| {
            let item = sub.items.data.into_iter().next();
            let unit_amount = item.as_ref().and_then(|i| i.price.unit_amount);
            let item_period_end = item.and_then(|i| i.current_period_end);
            ActiveSubscription {
                id: sub.id,
                unit_amount,
                current_period_end: sub.current_period_end.or(item_period_end),
            }
        }))
    }
}

// Stripe API response types

/// Stripe customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCustomer {
    /// Customer ID
    pub id: String,
    /// Customer email
    pub email: Option<String>,
    /// Whether the customer is deleted
    #[serde(default)]
    pub deleted: bool,
}

/// Stripe subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID
    pub id: String,
    /// Subscription status
    pub status: String,
    /// Current period end (Unix timestamp); moved onto items in newer API versions
    #[serde(default)]
    pub current_period_end: Option<i64>,
    /// Subscription items
    pub items: StripeList<StripeSubscriptionItem>,
}

/// Stripe subscription item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscriptionItem {
    /// Item price
    pub price: StripePrice,
    /// Current period end (Unix timestamp)
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

/// Stripe price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripePrice {
    /// Price ID
    pub id: String,
    /// Amount in cents
    pub unit_amount: Option<i64>,
}

/// Stripe checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID
    pub id: String,
    /// Checkout URL
    pub url: Option<String>,
}

/// Stripe billing portal session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeBillingPortalSession {
    /// Session ID
    pub id: String,
    /// Portal URL
    pub url: String,
}

/// Stripe list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeList<T> {
    /// List data
    pub data: Vec<T>,
    /// Whether there are more items
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}
