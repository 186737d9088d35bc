//! Favorite handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use histoires_types::{Favorite, StoryId};
use uuid::Uuid;

use super::shared::MAX_DISPLAY_NAME_LEN;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub story_id: StoryId,
    /// Defaults to the story title
    #[serde(default)]
    pub display_name: Option<String>,
}

/// GET /api/v1/favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Favorite>>> {
    let rows = state.stores.favorites.list_for_user(user.user_id.0).await?;
    Ok(Json(rows.into_iter().map(|r| r.into_favorite()).collect()))
}

/// POST /api/v1/favorites
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AddFavoriteRequest>,
) -> ApiResult<(StatusCode, Json<Favorite>)> {
    let story = state
        .stores
        .stories
        .find_by_id(req.story_id.0)
        .await?
        .map(|row| row.into_story())
        .filter(|story| story.is_visible_to(Some(&user.user_id)))
        .ok_or(ApiError::NotFound("Story"))?;

    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&story.title);
    if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "displayName must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }

    let row = state
        .stores
        .favorites
        .add(user.user_id.0, story.id.0, display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(row.into_favorite())))
}

/// DELETE /api/v1/favorites/{story_id}
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(story_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state
        .stores
        .favorites
        .remove(user.user_id.0, story_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Favorite"))
    }
}
