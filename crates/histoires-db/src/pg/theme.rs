//! PostgreSQL theme catalog repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::ThemeCategoryRow;
use crate::repo::ThemeRepository;

/// PostgreSQL theme repository
#[derive(Clone)]
pub struct PgThemeRepository {
    pool: PgPool,
}

impl PgThemeRepository {
    /// Create a new theme repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThemeRepository for PgThemeRepository {
    async fn list_categories(&self) -> DbResult<Vec<ThemeCategoryRow>> {
        let rows = sqlx::query_as::<_, ThemeCategoryRow>(
            "SELECT id, name, icon, themes, position FROM theme_categories ORDER BY position, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
