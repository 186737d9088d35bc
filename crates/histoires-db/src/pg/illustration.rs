//! PostgreSQL illustration cache repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::IllustrationRow;
use crate::repo::IllustrationCacheRepository;

/// PostgreSQL illustration cache repository
#[derive(Clone)]
pub struct PgIllustrationCacheRepository {
    pool: PgPool,
}

impl PgIllustrationCacheRepository {
    /// Create a new illustration cache repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IllustrationCacheRepository for PgIllustrationCacheRepository {
    async fn find(
        &self,
        content_hash: &str,
        fresh_since: DateTime<Utc>,
    ) -> DbResult<Option<IllustrationRow>> {
        let row = sqlx::query_as::<_, IllustrationRow>(
            r#"
            SELECT content_hash, image_url, prompt, created_at
            FROM illustration_cache
            WHERE content_hash = $1 AND created_at >= $2
            "#,
        )
        .bind(content_hash)
        .bind(fresh_since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(
        &self,
        content_hash: &str,
        image_url: &str,
        prompt: &str,
        fresh_since: DateTime<Utc>,
    ) -> DbResult<IllustrationRow> {
        // A fresh row keeps its values so RETURNING yields it; a stale one is overwritten.
        let row = sqlx::query_as::<_, IllustrationRow>(
            r#"
            INSERT INTO illustration_cache (content_hash, image_url, prompt)
            VALUES ($1, $2, $3)
            ON CONFLICT (content_hash)
            DO UPDATE SET
                image_url = CASE WHEN illustration_cache.created_at < $4
                    THEN EXCLUDED.image_url ELSE illustration_cache.image_url END,
                prompt = CASE WHEN illustration_cache.created_at < $4
                    THEN EXCLUDED.prompt ELSE illustration_cache.prompt END,
                created_at = CASE WHEN illustration_cache.created_at < $4
                    THEN NOW() ELSE illustration_cache.created_at END
            RETURNING content_hash, image_url, prompt, created_at
            "#,
        )
        .bind(content_hash)
        .bind(image_url)
        .bind(prompt)
        .bind(fresh_since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
