//! Library handlers: public stories, own stories and the reader view

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use histoires_db::AttachMedia;
use histoires_story_core::{paginate, StoryPage};
use histoires_types::{Story, StoryId};
use uuid::Uuid;

use super::shared::{validate_media_url, PageParams};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, AuthUser, OptionalAuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPagesResponse {
    pub story_id: StoryId,
    pub title: String,
    pub page_count: usize,
    pub pages: Vec<StoryPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub is_public: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachMediaRequest {
    pub illustration_url: Option<String>,
    pub audio_url: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/stories/public
pub async fn list_public_stories(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<Story>>> {
    let (limit, offset) = params.resolve();
    let rows = state.stores.stories.list_public(limit, offset).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_story()).collect()))
}

/// GET /api/v1/stories
pub async fn list_my_stories(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<Story>>> {
    let (limit, offset) = params.resolve();
    let rows = state
        .stores
        .stories
        .list_by_owner(user.user_id.0, limit, offset)
        .await?;
    Ok(Json(rows.into_iter().map(|r| r.into_story()).collect()))
}

/// GET /api/v1/stories/{id}
pub async fn get_story(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Story>> {
    visible_story(&state, &viewer, StoryId(id)).await.map(Json)
}

/// GET /api/v1/stories/{id}/pages
pub async fn get_story_pages(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StoryPagesResponse>> {
    let story = visible_story(&state, &viewer, StoryId(id)).await?;
    let pages = paginate(&story.content);
    Ok(Json(StoryPagesResponse {
        story_id: story.id,
        title: story.title,
        page_count: pages.len(),
        pages,
    }))
}

/// DELETE /api/v1/stories/{id}
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_story(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.stores.stories.delete(id, user.user_id.0).await? {
        return Err(ApiError::NotFound("Story"));
    }
    info!(story_id = %id, "Story deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/stories/{id}/visibility
pub async fn set_story_visibility(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<VisibilityRequest>,
) -> ApiResult<Json<Story>> {
    state
        .stores
        .stories
        .set_public(id, user.user_id.0, req.is_public)
        .await?
        .map(|row| Json(row.into_story()))
        .ok_or(ApiError::NotFound("Story"))
}

/// PUT /api/v1/stories/{id}/media
pub async fn attach_story_media(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<AttachMediaRequest>,
) -> ApiResult<Json<Story>> {
    if req.illustration_url.is_none() && req.audio_url.is_none() {
        return Err(ApiError::BadRequest(
            "illustrationUrl or audioUrl is required".into(),
        ));
    }
    if let Some(url) = &req.illustration_url {
        validate_media_url(url, "illustrationUrl")?;
    }
    if let Some(url) = &req.audio_url {
        validate_media_url(url, "audioUrl")?;
    }

    let media = AttachMedia {
        illustration_url: req.illustration_url,
        audio_url: req.audio_url,
    };
    state
        .stores
        .stories
        .attach_media(id, user.user_id.0, media)
        .await?
        .map(|row| Json(row.into_story()))
        .ok_or(ApiError::NotFound("Story"))
}

/// A story the viewer may read; private stories of others look missing
async fn visible_story(
    state: &AppState,
    viewer: &OptionalAuthUser,
    id: StoryId,
) -> ApiResult<Story> {
    state
        .stores
        .stories
        .find_by_id(id.0)
        .await?
        .map(|row| row.into_story())
        .filter(|story| story.is_visible_to(viewer.user_id()))
        .ok_or(ApiError::NotFound("Story"))
}
