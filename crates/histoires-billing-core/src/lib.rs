//! Histoires Billing Core - Subscriptions and usage quotas
//!
//! Stripe integration (customer lookup, checkout, billing portal,
//! subscription status), the cached tier resolver, and the quota gate that
//! meters stories, downloads and audio per billing period.
//!
//! # Example
//!
//! ```rust,ignore
//! use histoires_billing_core::{BillingConfig, QuotaGate, StripeProvider, SubscriptionService};
//!
//! let config = BillingConfig::new(Some("sk_test_...".into())).with_app_url("https://app.example.com");
//! let provider = Arc::new(StripeProvider::new(config.clone()));
//! let subscriptions = SubscriptionService::new(provider, stores.subscribers.clone(), config);
//!
//! let tier = subscriptions.tier(&user_id).await?;
//! quota.consume(&user_id, tier, UsageAction::Download).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod quota;
pub mod stripe;
pub mod subscription;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::{ActiveSubscription, PaymentProvider};
pub use quota::QuotaGate;
pub use stripe::StripeProvider;
pub use subscription::SubscriptionService;

// Re-export checkout types from histoires-types for convenience
pub use histoires_types::{CheckoutSession, PortalSession};
