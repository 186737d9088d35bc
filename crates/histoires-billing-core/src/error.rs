//! Billing errors

use thiserror::Error;

use histoires_types::UsageAction;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Stripe key not configured
    #[error("STRIPE_SECRET_KEY is not set")]
    MissingApiKey,

    /// No Stripe customer for the email
    #[error("no Stripe customer found for this account")]
    CustomerNotFound,

    /// No price to check out with
    #[error("no price configured for checkout")]
    MissingPrice,

    /// Payment provider error, carrying the provider's message
    #[error("{0}")]
    ProviderError(String),

    /// Usage limit reached for the period
    #[error("usage limit reached for {action}: {current} / {limit}")]
    UsageLimitExceeded {
        action: UsageAction,
        current: u32,
        limit: u32,
    },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] histoires_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CustomerNotFound)
    }

    /// Check if this is a provider error
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::ProviderError(_) | Self::MissingApiKey)
    }
}
