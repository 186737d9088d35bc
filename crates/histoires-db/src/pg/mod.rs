//! PostgreSQL repository implementations

mod favorite;
mod illustration;
mod profile;
mod rate_limit;
mod story;
mod subscriber;
mod theme;
mod usage;

pub use favorite::PgFavoriteRepository;
pub use illustration::PgIllustrationCacheRepository;
pub use profile::PgProfileRepository;
pub use rate_limit::PgRateLimitRepository;
pub use story::PgStoryRepository;
pub use subscriber::PgSubscriberRepository;
pub use theme::PgThemeRepository;
pub use usage::PgUsageRepository;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DbResult;
use crate::repo::{DatabaseHealth, Stores};
use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub stories: PgStoryRepository,
    pub favorites: PgFavoriteRepository,
    pub usage: PgUsageRepository,
    pub subscribers: PgSubscriberRepository,
    pub themes: PgThemeRepository,
    pub illustrations: PgIllustrationCacheRepository,
    pub profiles: PgProfileRepository,
    pub rate_limits: PgRateLimitRepository,
    pool: DbPool,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            stories: PgStoryRepository::new(pool.clone()),
            favorites: PgFavoriteRepository::new(pool.clone()),
            usage: PgUsageRepository::new(pool.clone()),
            subscribers: PgSubscriberRepository::new(pool.clone()),
            themes: PgThemeRepository::new(pool.clone()),
            illustrations: PgIllustrationCacheRepository::new(pool.clone()),
            profiles: PgProfileRepository::new(pool.clone()),
            rate_limits: PgRateLimitRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Connectivity check against the pool
#[derive(Clone)]
pub struct PgHealth {
    pool: DbPool,
}

#[async_trait]
impl DatabaseHealth for PgHealth {
    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl From<Repositories> for Stores {
    fn from(repos: Repositories) -> Self {
        Self {
            stories: Arc::new(repos.stories),
            favorites: Arc::new(repos.favorites),
            usage: Arc::new(repos.usage),
            subscribers: Arc::new(repos.subscribers),
            themes: Arc::new(repos.themes),
            illustrations: Arc::new(repos.illustrations),
            profiles: Arc::new(repos.profiles),
            rate_limits: Arc::new(repos.rate_limits),
            health: Arc::new(PgHealth { pool: repos.pool }),
        }
    }
}
