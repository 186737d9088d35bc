//! Fixed-window rate limiting backed by the shared `rate_limits` table.
//!
//! Counters live in Postgres so limits hold across instances and restarts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use histoires_db::RateLimitRepository;
use histoires_types::UserId;

use crate::error::ApiError;

/// What a rate limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKey {
    /// Story generations of one user
    StoryGeneration(UserId),
}

impl RateLimitKey {
    fn storage_key(&self) -> String {
        match self {
            Self::StoryGeneration(user_id) => format!("generate:{user_id}"),
        }
    }
}

/// Fixed-window limiter
#[derive(Clone)]
pub struct RateLimiter {
    repo: Arc<dyn RateLimitRepository>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(repo: Arc<dyn RateLimitRepository>, limit: u32, window: Duration) -> Self {
        Self {
            repo,
            limit,
            window,
        }
    }

    /// Count one hit and reject it once the window is full.
    ///
    /// A limit of zero disables limiting.
    pub async fn check(&self, key: RateLimitKey) -> Result<(), ApiError> {
        if self.limit == 0 {
            return Ok(());
        }

        let row = self.repo.hit(&key.storage_key(), self.window).await?;
        let count = u32::try_from(row.count).unwrap_or(0);
        if count <= self.limit {
            return Ok(());
        }

        let retry_after_secs = u64::try_from((row.expires_at - Utc::now()).num_seconds())
            .unwrap_or(0)
            .max(1);
        debug!(?key, count, retry_after_secs, "Rate limit exceeded");
        Err(ApiError::RateLimited { retry_after_secs })
    }

    /// Delete expired windows
    pub async fn purge_expired(&self) -> Result<u64, ApiError> {
        Ok(self.repo.purge_expired().await?)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
