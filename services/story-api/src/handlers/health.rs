//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Which provider keys are configured
///
/// A missing key does not make the service unready; the matching endpoints
/// answer with a `PROVIDER_ERROR` instead.
#[derive(Debug, Serialize)]
pub struct ProviderKeys {
    pub openai: bool,
    pub elevenlabs: bool,
    pub stripe: bool,
}

impl ProviderKeys {
    fn from_state(state: &AppState) -> Self {
        Self {
            openai: state.config.openai.api_key.is_some(),
            elevenlabs: state.config.elevenlabs.api_key.is_some(),
            stripe: state.config.billing.stripe_secret_key.is_some(),
        }
    }
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub providers: ProviderKeys,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ready once the database answers; reports provider key presence
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let providers = ProviderKeys::from_state(&state);

    match state.stores.health.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                database: "connected",
                providers,
            }),
        ),
        Err(e) => {
            tracing::error!(error = ?e, ?providers, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "unavailable",
                    database: "unreachable",
                    providers,
                }),
            )
        }
    }
}
