//! Billing configuration

use std::time::Duration;

use histoires_types::PriceId;

/// Public Stripe API endpoint
pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Billing service configuration
#[derive(Clone)]
pub struct BillingConfig {
    /// Stripe secret key; calls fail with `MissingApiKey` when absent
    pub stripe_secret_key: Option<String>,
    /// Stripe API base URL
    pub api_base: String,
    /// Price used when a checkout does not name one
    pub default_price_id: Option<PriceId>,
    /// Redirect after a completed checkout
    pub success_url: String,
    /// Redirect after an abandoned checkout
    pub cancel_url: String,
    /// Redirect when leaving the billing portal
    pub portal_return_url: String,
    /// How long a resolved tier is trusted in-process
    pub tier_cache_ttl: Duration,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(stripe_secret_key: Option<String>) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.filter(|k| !k.trim().is_empty()),
            api_base: STRIPE_API_BASE.to_string(),
            default_price_id: None,
            success_url: "http://localhost:5173/dashboard?checkout=success".to_string(),
            cancel_url: "http://localhost:5173/paywall".to_string(),
            portal_return_url: "http://localhost:5173/dashboard".to_string(),
            tier_cache_ttl: Duration::from_secs(60),
        }
    }

    /// Point the redirect URLs at the front end
    pub fn with_app_url(mut self, app_url: &str) -> Self {
        let app_url = app_url.trim_end_matches('/');
        self.success_url = format!("{app_url}/dashboard?checkout=success");
        self.cancel_url = format!("{app_url}/paywall");
        self.portal_return_url = format!("{app_url}/dashboard");
        self
    }

    /// Set the Stripe API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default checkout price
    pub fn with_default_price(mut self, price_id: Option<PriceId>) -> Self {
        self.default_price_id = price_id;
        self
    }

    /// Set the tier cache TTL
    pub fn with_tier_cache_ttl(mut self, ttl: Duration) -> Self {
        self.tier_cache_ttl = ttl;
        self
    }
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "[redacted]"))
            .field("api_base", &self.api_base)
            .field("default_price_id", &self.default_price_id)
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .field("portal_return_url", &self.portal_return_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_url_redirects() {
        let config = BillingConfig::new(None).with_app_url("https://histoires.example/");
        assert_eq!(config.success_url, "https://histoires.example/dashboard?checkout=success");
        assert_eq!(config.cancel_url, "https://histoires.example/paywall");
        assert_eq!(config.portal_return_url, "https://histoires.example/dashboard");
    }

    #[test]
    fn test_blank_key_is_missing() {
        assert!(BillingConfig::new(Some("  ".to_string())).stripe_secret_key.is_none());
    }
}
