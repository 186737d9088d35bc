//! Account deletion handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountResponse {
    pub deleted_stories: u64,
    pub deleted_favorites: u64,
    pub deleted_profile: bool,
}

/// DELETE /api/v1/account
///
/// Removes the caller's stories, favorites and profile. Usage counters are
/// kept since the identity itself survives, as does the subscriber record
/// of the payment processor's customer.
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DeleteAccountResponse>> {
    let user_id = user.user_id.0;

    let deleted_favorites = state.stores.favorites.delete_all_for_user(user_id).await?;
    let deleted_stories = state.stores.stories.delete_all_for_owner(user_id).await?;
    let deleted_profile = state.stores.profiles.delete(user_id).await?;
    state.subscriptions.invalidate(&user.user_id).await;

    info!(deleted_stories, deleted_favorites, deleted_profile, "Account data deleted");

    Ok(Json(DeleteAccountResponse {
        deleted_stories,
        deleted_favorites,
        deleted_profile,
    }))
}
