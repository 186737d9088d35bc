//! Subscription and checkout handlers

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use histoires_types::{PriceId, SubscriptionState, Tier};

use super::shared::record_op_duration;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    /// Defaults to the configured price
    pub price_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscribed: bool,
    /// Paid tier, absent when unsubscribed
    pub subscription_tier: Option<Tier>,
    /// Tier whose limits apply
    pub tier: Tier,
    pub tier_label: &'static str,
    pub subscription_end: Option<DateTime<Utc>>,
}

impl From<SubscriptionState> for SubscriptionResponse {
    fn from(state: SubscriptionState) -> Self {
        let tier = state.effective_tier();
        Self {
            subscribed: state.subscribed,
            subscription_tier: state.tier.filter(|_| state.subscribed),
            tier,
            tier_label: tier.label(),
            subscription_end: state.subscription_end,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/billing/checkout
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();
    let email = user.require_email()?;
    let price_id = req
        .price_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PriceId::new);

    let result = state.subscriptions.checkout(email, price_id).await;
    record_op_duration("create_checkout", start, result.is_ok());
    let session = result?;

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// POST /api/v1/billing/portal
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn open_portal(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<PortalResponse>> {
    let start = Instant::now();
    let email = user.require_email()?;

    let result = state.subscriptions.portal(email).await;
    record_op_duration("open_portal", start, result.is_ok());

    Ok(Json(PortalResponse { url: result?.url }))
}

/// POST /api/v1/billing/subscription/check
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn check_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let email = user.require_email()?;

    let result = state.subscriptions.check(&user.user_id, email).await;
    record_op_duration("check_subscription", start, result.is_ok());

    Ok(Json(result?.into()))
}

/// GET /api/v1/billing/subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<SubscriptionResponse>> {
    let subscription = state
        .subscriptions
        .cached_state(&user.user_id)
        .await?
        .unwrap_or_else(|| {
            SubscriptionState::free(user.email.clone().unwrap_or_default(), Some(user.user_id))
        });
    Ok(Json(subscription.into()))
}
