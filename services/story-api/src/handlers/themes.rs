//! Theme catalog handler

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use histoires_types::ThemeCategory;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/v1/themes
pub async fn list_themes(State(state): State<AppState>) -> ApiResult<Json<Vec<ThemeCategory>>> {
    if let Some(cached) = state.themes.get(&()).await {
        return Ok(Json(cached.as_ref().clone()));
    }

    let categories: Vec<ThemeCategory> = state
        .stores
        .themes
        .list_categories()
        .await?
        .into_iter()
        .map(|row| row.into_category())
        .collect();

    state.themes.insert((), Arc::new(categories.clone())).await;
    Ok(Json(categories))
}
