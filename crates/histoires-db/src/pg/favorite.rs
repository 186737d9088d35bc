//! PostgreSQL favorite repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::FavoriteRow;
use crate::repo::FavoriteRepository;

/// PostgreSQL favorite repository
#[derive(Clone)]
pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    /// Create a new favorite repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<FavoriteRow>> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r#"
            SELECT user_id, story_id, display_name, created_at
            FROM story_favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn add(&self, user_id: Uuid, story_id: Uuid, display_name: &str) -> DbResult<FavoriteRow> {
        let row = sqlx::query_as::<_, FavoriteRow>(
            r#"
            INSERT INTO story_favorites (user_id, story_id, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, story_id)
            DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING user_id, story_id, display_name, created_at
            "#,
        )
        .bind(user_id)
        .bind(story_id)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn remove(&self, user_id: Uuid, story_id: Uuid) -> DbResult<bool> {
        let result =
            sqlx::query("DELETE FROM story_favorites WHERE user_id = $1 AND story_id = $2")
                .bind(user_id)
                .bind(story_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM story_favorites WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
