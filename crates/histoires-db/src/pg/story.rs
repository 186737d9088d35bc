//! PostgreSQL story repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::StoryRow;
use crate::repo::{AttachMedia, CreateStory, StoryRepository};

const STORY_COLUMNS: &str = "id, owner_id, title, theme, tone, child_name, child_age, content, \
     illustration_url, audio_url, is_public, created_at, updated_at";

/// PostgreSQL story repository
#[derive(Clone)]
pub struct PgStoryRepository {
    pool: PgPool,
}

impl PgStoryRepository {
    /// Create a new story repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoryRepository for PgStoryRepository {
    async fn create(&self, story: CreateStory) -> DbResult<StoryRow> {
        let row = sqlx::query_as::<_, StoryRow>(&format!(
            r#"
            INSERT INTO stories (id, owner_id, title, theme, tone, child_name, child_age, content)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {STORY_COLUMNS}
            "#
        ))
        .bind(story.id)
        .bind(story.owner_id)
        .bind(&story.title)
        .bind(&story.theme)
        .bind(&story.tone)
        .bind(&story.child_name)
        .bind(story.child_age)
        .bind(&story.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<StoryRow>> {
        let row = sqlx::query_as::<_, StoryRow>(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_public(&self, limit: i64, offset: i64) -> DbResult<Vec<StoryRow>> {
        let rows = sqlx::query_as::<_, StoryRow>(&format!(
            r#"
            SELECT {STORY_COLUMNS}
            FROM stories
            WHERE is_public
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<StoryRow>> {
        let rows = sqlx::query_as::<_, StoryRow>(&format!(
            r#"
            SELECT {STORY_COLUMNS}
            FROM stories
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn set_public(
        &self,
        id: Uuid,
        owner_id: Uuid,
        is_public: bool,
    ) -> DbResult<Option<StoryRow>> {
        let row = sqlx::query_as::<_, StoryRow>(&format!(
            r#"
            UPDATE stories SET is_public = $1, updated_at = NOW()
            WHERE id = $2 AND owner_id = $3
            RETURNING {STORY_COLUMNS}
            "#
        ))
        .bind(is_public)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn attach_media(
        &self,
        id: Uuid,
        owner_id: Uuid,
        media: AttachMedia,
    ) -> DbResult<Option<StoryRow>> {
        let row = sqlx::query_as::<_, StoryRow>(&format!(
            r#"
            UPDATE stories
            SET illustration_url = COALESCE($1, illustration_url),
                audio_url = COALESCE($2, audio_url),
                updated_at = NOW()
            WHERE id = $3 AND owner_id = $4
            RETURNING {STORY_COLUMNS}
            "#
        ))
        .bind(&media.illustration_url)
        .bind(&media.audio_url)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_owner(&self, owner_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM stories WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
