//! Story generation handler
//!
//! Auth, quota and rate limit checks all run before any provider call.
//! Quota is consumed only once a story has been generated and passed
//! moderation, so refusals and provider failures are free.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use histoires_db::CreateStory;
use histoires_story_core::{GeneratedStory, StoryRequest};
use histoires_types::{StoryId, UsageAction, UsageCounters};

use super::shared::record_op_duration;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::rate_limit::RateLimitKey;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Form fields; missing values are reported by validation, not by the decoder
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateStoryRequest {
    pub child_name: String,
    pub child_age: Option<u8>,
    pub theme: String,
    pub tone: Option<String>,
    pub customization: Option<String>,
}

impl From<GenerateStoryRequest> for StoryRequest {
    fn from(req: GenerateStoryRequest) -> Self {
        Self {
            child_name: req.child_name,
            child_age: req.child_age.unwrap_or(0),
            theme: req.theme,
            tone: req.tone,
            customization: req.customization,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStoryResponse {
    #[serde(flatten)]
    pub story: GeneratedStory,
    /// ID of the saved story; absent for refusals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<StoryId>,
    /// Counters after this generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageCounters>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/stories/generate
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn generate_story(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<GenerateStoryRequest>,
) -> ApiResult<Json<GenerateStoryResponse>> {
    let start = Instant::now();
    let result = run_generation(&state, &user, req.into()).await;
    record_op_duration("generate_story", start, result.is_ok());

    let outcome = match &result {
        Ok(res) if res.story.blocked => "blocked",
        Ok(_) => "ok",
        Err(_) => "error",
    };
    metrics::counter!("story_generations_total", "result" => outcome).increment(1);

    result.map(Json)
}

async fn run_generation(
    state: &AppState,
    user: &AuthUser,
    request: StoryRequest,
) -> ApiResult<GenerateStoryResponse> {
    request.validate()?;

    let tier = state.subscriptions.tier(&user.user_id).await?;
    state
        .quota
        .ensure_allowed(&user.user_id, tier, UsageAction::CreateStory)
        .await?;
    state
        .rate_limiter
        .check(RateLimitKey::StoryGeneration(user.user_id))
        .await?;

    let generated = state.generator.generate(&request).await?;
    if generated.blocked {
        return Ok(GenerateStoryResponse {
            story: generated,
            story_id: None,
            usage: None,
        });
    }

    // A concurrent request may have used the last slot since the check above
    let usage = state
        .quota
        .consume(&user.user_id, tier, UsageAction::CreateStory)
        .await?;

    let row = state
        .stores
        .stories
        .create(CreateStory {
            id: StoryId::new().0,
            owner_id: user.user_id.0,
            title: generated.title.clone(),
            theme: generated.metadata.theme.clone(),
            tone: generated.metadata.tone.clone(),
            child_name: request.name().to_string(),
            child_age: i16::from(request.child_age),
            content: generated.story.clone(),
        })
        .await?;

    info!(story_id = %row.id, %tier, "Story saved");

    Ok(GenerateStoryResponse {
        story: generated,
        story_id: Some(StoryId(row.id)),
        usage: Some(usage),
    })
}
