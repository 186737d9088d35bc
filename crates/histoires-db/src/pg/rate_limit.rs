//! PostgreSQL rate limit counter implementation

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::RateLimitRow;
use crate::repo::RateLimitRepository;

/// PostgreSQL fixed-window counters
#[derive(Clone)]
pub struct PgRateLimitRepository {
    pool: PgPool,
}

impl PgRateLimitRepository {
    /// Create a new rate limit repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitRepository for PgRateLimitRepository {
    async fn hit(&self, key: &str, window: Duration) -> DbResult<RateLimitRow> {
        // An expired window restarts at 1 with a fresh expiry.
        let row = sqlx::query_as::<_, RateLimitRow>(
            r#"
            INSERT INTO rate_limits (key, count, expires_at)
            VALUES ($1, 1, NOW() + make_interval(secs => $2::DOUBLE PRECISION))
            ON CONFLICT (key) DO UPDATE SET
                count = CASE WHEN rate_limits.expires_at <= NOW() THEN 1
                             ELSE rate_limits.count + 1 END,
                expires_at = CASE WHEN rate_limits.expires_at <= NOW() THEN EXCLUDED.expires_at
                                  ELSE rate_limits.expires_at END
            RETURNING key, count, expires_at
            "#,
        )
        .bind(key)
        .bind(window.as_secs_f64())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn purge_expired(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
