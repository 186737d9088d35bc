//! Shared handler utilities
//!
//! Paging, validation and metrics helpers used across handlers.

use std::time::Instant;

use serde::Deserialize;

use crate::error::ApiError;

/// Default page size for story lists
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: i64 = 50;

/// Longest accepted favorite display name, in characters
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// Longest accepted media URL
const MAX_URL_LEN: usize = 2_048;

/// `?limit=&offset=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    /// Clamped `(limit, offset)`
    pub fn resolve(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Validate an absolute http(s) URL supplied by a client
pub fn validate_media_url(value: &str, field_name: &str) -> Result<(), ApiError> {
    if value.len() > MAX_URL_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field_name} too long (max {MAX_URL_LEN} chars)"
        )));
    }
    let is_http = value.starts_with("https://") || value.starts_with("http://");
    if !is_http || value.chars().any(char::is_whitespace) {
        return Err(ApiError::BadRequest(format!(
            "{field_name} must be an http(s) URL"
        )));
    }
    Ok(())
}

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "story_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_are_clamped() {
        assert_eq!(PageParams::default().resolve(), (DEFAULT_PAGE_SIZE, 0));
        let params = PageParams {
            limit: Some(1_000),
            offset: Some(-5),
        };
        assert_eq!(params.resolve(), (MAX_PAGE_SIZE, 0));
        let params = PageParams {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(params.resolve(), (1, 40));
    }

    #[test]
    fn test_validate_media_url() {
        assert!(validate_media_url("https://cdn.example/a.png", "illustrationUrl").is_ok());
        assert!(validate_media_url("http://localhost/a.mp3", "audioUrl").is_ok());
        assert!(validate_media_url("javascript:alert(1)", "audioUrl").is_err());
        assert!(validate_media_url("https://cdn.example/a b.png", "audioUrl").is_err());
        let long = format!("https://{}", "a".repeat(MAX_URL_LEN));
        assert!(validate_media_url(&long, "audioUrl").is_err());
    }
}
