//! PostgreSQL usage counters repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use histoires_types::UsageAction;

use crate::error::DbResult;
use crate::models::UsageRow;
use crate::repo::UsageRepository;

const USAGE_COLUMNS: &str =
    "user_id, period, stories_count, downloads_count, audio_count, updated_at";

/// Counter column for an action
fn counter_column(action: UsageAction) -> &'static str {
    match action {
        UsageAction::CreateStory => "stories_count",
        UsageAction::Download => "downloads_count",
        UsageAction::GenerateAudio => "audio_count",
    }
}

/// PostgreSQL usage repository
#[derive(Clone)]
pub struct PgUsageRepository {
    pool: PgPool,
}

impl PgUsageRepository {
    /// Create a new usage repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository {
    async fn get(&self, user_id: Uuid, period: &str) -> DbResult<Option<UsageRow>> {
        let row = sqlx::query_as::<_, UsageRow>(&format!(
            "SELECT {USAGE_COLUMNS} FROM usage_counters WHERE user_id = $1 AND period = $2"
        ))
        .bind(user_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn try_increment(
        &self,
        user_id: Uuid,
        period: &str,
        action: UsageAction,
        limit: Option<u32>,
    ) -> DbResult<Option<UsageRow>> {
        // A fresh row starts at 1, which a zero limit never allows.
        if limit == Some(0) {
            return Ok(None);
        }

        let column = counter_column(action);
        // The WHERE on the conflict branch turns the upsert into a no-op once the
        // limit is reached, in which case nothing is returned.
        let row = sqlx::query_as::<_, UsageRow>(&format!(
            r#"
            INSERT INTO usage_counters (user_id, period, {column})
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, period)
            DO UPDATE SET {column} = usage_counters.{column} + 1, updated_at = NOW()
            WHERE $3::INTEGER IS NULL OR usage_counters.{column} < $3::INTEGER
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(period)
        .bind(limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX)))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
