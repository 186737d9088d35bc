//! Histoires Magiques Story API
//!
//! HTTP service for the children's story application.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/stories/generate` - Generate a moderated story
//! - `POST /api/v1/illustrations` - Generate (or reuse) an illustration
//! - `POST /api/v1/audio` - Synthesize narration
//! - `GET /api/v1/stories/public` - Public library
//! - `GET /api/v1/stories` - Own stories
//! - `GET|DELETE /api/v1/stories/{id}` - Story by ID
//! - `GET /api/v1/stories/{id}/pages` - Paginated reader view
//! - `PATCH /api/v1/stories/{id}/visibility` - Public flag
//! - `PUT /api/v1/stories/{id}/media` - Attach media URLs
//! - `GET /api/v1/themes` - Theme categories
//! - `GET|POST /api/v1/favorites`, `DELETE /api/v1/favorites/{story_id}`
//! - `GET /api/v1/usage`, `POST /api/v1/usage/downloads`
//! - `POST /api/v1/billing/checkout` - Stripe checkout session
//! - `POST /api/v1/billing/portal` - Stripe customer portal
//! - `POST /api/v1/billing/subscription/check` - Refresh subscription state
//! - `GET /api/v1/billing/subscription` - Stored subscription state
//! - `DELETE /api/v1/account` - Delete account data
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! Other `GET` requests are resolved against the client route table.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::{get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use config::{Config, ConfigError};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use handlers::{health, ready};

/// Build the HTTP router
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();
    let cors = cors_layer(&state.config.allowed_origins);

    let api_v1 = Router::new()
        // Generation
        .route("/stories/generate", post(handlers::generate_story))
        .route("/illustrations", post(handlers::generate_illustration))
        .route("/audio", post(handlers::generate_audio))
        // Library
        .route("/stories", get(handlers::list_my_stories))
        .route("/stories/public", get(handlers::list_public_stories))
        .route(
            "/stories/{id}",
            get(handlers::get_story).delete(handlers::delete_story),
        )
        .route("/stories/{id}/pages", get(handlers::get_story_pages))
        .route(
            "/stories/{id}/visibility",
            patch(handlers::set_story_visibility),
        )
        .route("/stories/{id}/media", put(handlers::attach_story_media))
        .route("/themes", get(handlers::list_themes))
        .route(
            "/favorites",
            get(handlers::list_favorites).post(handlers::add_favorite),
        )
        .route(
            "/favorites/{story_id}",
            axum::routing::delete(handlers::remove_favorite),
        )
        // Usage
        .route("/usage", get(handlers::get_usage))
        .route("/usage/downloads", post(handlers::record_download))
        // Billing
        .route("/billing/checkout", post(handlers::create_checkout))
        .route("/billing/portal", post(handlers::open_portal))
        .route(
            "/billing/subscription/check",
            post(handlers::check_subscription),
        )
        .route("/billing/subscription", get(handlers::get_subscription))
        // Account
        .route("/account", axum::routing::delete(handlers::delete_account));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        // Provider calls are bounded by this timeout (innermost)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .fallback(routes::spa_fallback)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Install the Prometheus recorder and describe the service metrics
pub fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Provider calls dominate; generation routinely takes several seconds
    let provider_latency_buckets = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("story_operation_duration_seconds".to_string()),
        provider_latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!(
        "story_generations_total",
        "Story generation requests by result (ok, blocked, error)"
    );
    metrics::describe_counter!(
        "quota_rejections_total",
        "Requests rejected by the usage quota, by action"
    );
    metrics::describe_histogram!(
        "story_operation_duration_seconds",
        "Provider-backed operation latency in seconds by operation type"
    );

    Ok(handle)
}
