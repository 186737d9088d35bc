//! Client route table
//!
//! Pages of the single-page front end. Non-API `GET` requests are resolved
//! against this table: known routes get the SPA index document, anything
//! else is a 404.

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// A page of the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "camelCase")]
pub enum ClientRoute {
    Home,
    Auth,
    AuthCallback,
    EmailConfirmation,
    ResetPassword,
    Dashboard,
    Library,
    LibraryStory { id: Uuid },
    DashboardStory { id: Uuid },
    Legal,
    Paywall,
    Terms,
}

impl ClientRoute {
    /// Resolve a request path; `None` is the catch-all 404 page
    pub fn resolve(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();

        let route = match segments.as_slice() {
            [] => Self::Home,
            ["auth"] => Self::Auth,
            ["auth", "callback"] => Self::AuthCallback,
            ["email-confirmation"] => Self::EmailConfirmation,
            ["reset-password"] => Self::ResetPassword,
            ["dashboard"] => Self::Dashboard,
            ["library"] => Self::Library,
            ["library", id] => Self::LibraryStory {
                id: Uuid::parse_str(id).ok()?,
            },
            ["dashboard", "library", id] => Self::DashboardStory {
                id: Uuid::parse_str(id).ok()?,
            },
            ["legal"] => Self::Legal,
            ["paywall"] => Self::Paywall,
            ["cgu"] => Self::Terms,
            _ => return None,
        };
        Some(route)
    }

    /// Canonical path of the page
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Auth => "/auth".to_string(),
            Self::AuthCallback => "/auth/callback".to_string(),
            Self::EmailConfirmation => "/email-confirmation".to_string(),
            Self::ResetPassword => "/reset-password".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Library => "/library".to_string(),
            Self::LibraryStory { id } => format!("/library/{id}"),
            Self::DashboardStory { id } => format!("/dashboard/library/{id}"),
            Self::Legal => "/legal".to_string(),
            Self::Paywall => "/paywall".to_string(),
            Self::Terms => "/cgu".to_string(),
        }
    }

    /// Whether the page is only reachable when signed in
    pub const fn requires_auth(&self) -> bool {
        matches!(self, Self::Dashboard | Self::DashboardStory { .. })
    }
}

/// Router fallback: SPA index for client routes, JSON 404 otherwise
pub async fn spa_fallback(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let path = uri.path();
    if method != Method::GET || path.starts_with("/api/") {
        return ApiError::NotFound("Route").into_response();
    }

    match (ClientRoute::resolve(path), &state.spa_index) {
        (Some(_), Some(index)) => Html(index.to_string()).into_response(),
        _ => ApiError::NotFound("Page").into_response(),
    }
}
