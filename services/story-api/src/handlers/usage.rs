//! Usage handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

use histoires_types::{Tier, TierLimits, UsageAction, UsageCounters, UsageSnapshot};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub period: String,
    pub tier: Tier,
    pub tier_label: &'static str,
    #[serde(flatten)]
    pub counters: UsageCounters,
    /// `null` means unlimited
    pub limits: TierLimits,
    pub can_create_story: bool,
    pub can_download: bool,
    pub can_generate_audio: bool,
    pub remaining: RemainingUsage,
}

/// Remaining actions this period; `null` means unlimited
#[derive(Debug, Serialize)]
pub struct RemainingUsage {
    pub stories: Option<u32>,
    pub downloads: Option<u32>,
    pub audio: Option<u32>,
}

impl From<UsageSnapshot> for UsageResponse {
    fn from(snapshot: UsageSnapshot) -> Self {
        Self {
            tier_label: snapshot.tier.label(),
            can_create_story: snapshot.can_create_story(),
            can_download: snapshot.can_download(),
            can_generate_audio: snapshot.can_generate_audio(),
            remaining: RemainingUsage {
                stories: snapshot.remaining(UsageAction::CreateStory),
                downloads: snapshot.remaining(UsageAction::Download),
                audio: snapshot.remaining(UsageAction::GenerateAudio),
            },
            period: snapshot.period,
            tier: snapshot.tier,
            counters: snapshot.counters,
            limits: snapshot.limits,
        }
    }
}

/// GET /api/v1/usage
pub async fn get_usage(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UsageResponse>> {
    let tier = state.subscriptions.tier(&user.user_id).await?;
    let snapshot = state.quota.snapshot(&user.user_id, tier).await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/v1/usage/downloads
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn record_download(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UsageResponse>> {
    let tier = state.subscriptions.tier(&user.user_id).await?;
    state
        .quota
        .consume(&user.user_id, tier, UsageAction::Download)
        .await?;
    let snapshot = state.quota.snapshot(&user.user_id, tier).await?;
    Ok(Json(snapshot.into()))
}
