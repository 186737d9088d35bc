//! Illustration and narration handlers

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use histoires_db::AttachMedia;
use histoires_story_core::elevenlabs::MAX_TTS_CHARS;
use histoires_story_core::Illustration;
use histoires_types::{StoryId, UsageAction, UsageCounters};

use super::shared::record_op_duration;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IllustrationRequest {
    pub text: String,
    pub style: Option<String>,
    /// Attach the image to this story when the caller owns it
    pub story_id: Option<StoryId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustrationResponse {
    #[serde(flatten)]
    pub illustration: Illustration,
    /// Whether the image was attached to the requested story
    pub attached: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioRequest {
    pub text: String,
    pub voice_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResponse {
    /// Base64-encoded audio
    pub audio_content: String,
    pub content_type: String,
    pub usage: UsageCounters,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/illustrations
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn generate_illustration(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<IllustrationRequest>,
) -> ApiResult<Json<IllustrationResponse>> {
    let start = Instant::now();

    let result = state
        .illustrations
        .illustrate(&req.text, req.style.as_deref())
        .await;
    record_op_duration("generate_illustration", start, result.is_ok());
    let illustration = result?;

    let mut attached = false;
    if let Some(story_id) = req.story_id {
        let media = AttachMedia {
            illustration_url: Some(illustration.image_url.clone()),
            audio_url: None,
        };
        attached = state
            .stores
            .stories
            .attach_media(story_id.0, user.user_id.0, media)
            .await?
            .is_some();
        debug!(%story_id, attached, "Illustration attachment");
    }

    Ok(Json(IllustrationResponse {
        illustration,
        attached,
    }))
}

/// POST /api/v1/audio
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn generate_audio(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AudioRequest>,
) -> ApiResult<Json<AudioResponse>> {
    let start = Instant::now();

    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }
    if text.chars().count() > MAX_TTS_CHARS {
        return Err(ApiError::BadRequest(format!(
            "text must be at most {MAX_TTS_CHARS} characters"
        )));
    }

    let tier = state.subscriptions.tier(&user.user_id).await?;
    state
        .quota
        .ensure_allowed(&user.user_id, tier, UsageAction::GenerateAudio)
        .await?;

    let result = state.speech.synthesize(text, req.voice_id.as_deref()).await;
    record_op_duration("generate_audio", start, result.is_ok());
    let audio = result?;

    let usage = state
        .quota
        .consume(&user.user_id, tier, UsageAction::GenerateAudio)
        .await?;

    Ok(Json(AudioResponse {
        audio_content: audio.to_base64(),
        content_type: audio.content_type,
        usage,
    }))
}
