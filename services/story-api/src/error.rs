//! Error types for the Story API service.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use histoires_billing_core::BillingError;
use histoires_db::DbError;
use histoires_story_core::{GenerationError, ProviderErrorCategory};
use histoires_types::UsageAction;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Usage limit reached for {action} ({limit} per month)")]
    QuotaExceeded { action: UsageAction, limit: u32 },

    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Upstream provider failure; the message is passed through
    #[error("{message}")]
    Provider {
        message: String,
        category: ProviderErrorCategory,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(#[from] DbError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) | Self::Database(DbError::NotFound) => StatusCode::NOT_FOUND,
            Self::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Provider { .. } | Self::Internal(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) | Self::Database(DbError::NotFound) => "NOT_FOUND",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::Internal(_) | Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::QuotaExceeded { action, limit } => {
                Some(json!({ "action": action.as_str(), "limit": limit }))
            }
            Self::RateLimited { retry_after_secs } => {
                Some(json!({ "retryAfter": retry_after_secs }))
            }
            Self::Provider { category, .. } => Some(json!({ "category": category.as_str() })),
            _ => None,
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        if err.is_validation() {
            return Self::BadRequest(err.to_string());
        }
        match err {
            GenerationError::Database(db) => Self::Database(db),
            other => Self::Provider {
                category: other.category(),
                message: other.to_string(),
            },
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::CustomerNotFound => Self::NotFound("Customer"),
            BillingError::UsageLimitExceeded { action, limit, .. } => {
                metrics::counter!("quota_rejections_total", "action" => action.as_str())
                    .increment(1);
                Self::QuotaExceeded { action, limit }
            }
            BillingError::Database(db) => Self::Database(db),
            BillingError::MissingApiKey => Self::Provider {
                message: err.to_string(),
                category: ProviderErrorCategory::ApiKeyMissing,
            },
            BillingError::ProviderError(message) => Self::Provider {
                category: ProviderErrorCategory::classify(&message),
                message,
            },
            BillingError::MissingPrice => Self::BadRequest("priceId is required".to_string()),
            BillingError::Internal(message) => Self::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        // Never leak details about the database
        let message = match &self {
            Self::Database(DbError::NotFound) => "Record not found".to_string(),
            Self::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let retry_after = match &self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
