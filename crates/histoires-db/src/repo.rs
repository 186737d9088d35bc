//! Repository traits
//!
//! Define async repository interfaces for database operations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use histoires_types::UsageAction;

use crate::error::DbResult;
use crate::models::*;

/// Story repository trait
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Insert a new story
    async fn create(&self, story: CreateStory) -> DbResult<StoryRow>;

    /// Find a story by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<StoryRow>>;

    /// List public stories, newest first
    async fn list_public(&self, limit: i64, offset: i64) -> DbResult<Vec<StoryRow>>;

    /// List a user's stories, newest first
    async fn list_by_owner(&self, owner_id: Uuid, limit: i64, offset: i64)
        -> DbResult<Vec<StoryRow>>;

    /// Set the public flag of an owned story
    ///
    /// Returns `None` if the story does not exist or is owned by someone else.
    async fn set_public(&self, id: Uuid, owner_id: Uuid, is_public: bool)
        -> DbResult<Option<StoryRow>>;

    /// Attach illustration and/or audio URLs to an owned story
    async fn attach_media(
        &self,
        id: Uuid,
        owner_id: Uuid,
        media: AttachMedia,
    ) -> DbResult<Option<StoryRow>>;

    /// Delete an owned story
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> DbResult<bool>;

    /// Delete all stories of a user
    async fn delete_all_for_owner(&self, owner_id: Uuid) -> DbResult<u64>;
}

/// Create story input
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub theme: String,
    pub tone: Option<String>,
    pub child_name: String,
    pub child_age: i16,
    pub content: String,
}

/// Media URLs to attach; `None` leaves the current value
#[derive(Debug, Clone, Default)]
pub struct AttachMedia {
    pub illustration_url: Option<String>,
    pub audio_url: Option<String>,
}

/// Favorite repository trait
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// List a user's favorites, newest first
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<FavoriteRow>>;

    /// Add (or rename) a favorite
    async fn add(&self, user_id: Uuid, story_id: Uuid, display_name: &str)
        -> DbResult<FavoriteRow>;

    /// Remove a favorite
    async fn remove(&self, user_id: Uuid, story_id: Uuid) -> DbResult<bool>;

    /// Remove all favorites of a user
    async fn delete_all_for_user(&self, user_id: Uuid) -> DbResult<u64>;
}

/// Usage counters repository trait
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Get a user's counters for a period
    async fn get(&self, user_id: Uuid, period: &str) -> DbResult<Option<UsageRow>>;

    /// Increment one counter if it is below `limit`
    ///
    /// `limit = None` increments unconditionally. Returns the updated row, or
    /// `None` when the counter was already at the limit. The check and the
    /// increment happen atomically.
    async fn try_increment(
        &self,
        user_id: Uuid,
        period: &str,
        action: UsageAction,
        limit: Option<u32>,
    ) -> DbResult<Option<UsageRow>>;
}

/// Subscriber repository trait
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Find the cached subscription state by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<SubscriberRow>>;

    /// Find the cached subscription state by user ID
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriberRow>>;

    /// Insert or replace the state for an email
    async fn upsert(&self, subscriber: UpsertSubscriber) -> DbResult<SubscriberRow>;
}

/// Upsert subscriber input (conflict target = email)
#[derive(Debug, Clone)]
pub struct UpsertSubscriber {
    pub email: String,
    pub user_id: Option<Uuid>,
    pub subscribed: bool,
    pub subscription_tier: Option<String>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
}

/// Theme catalog repository trait
#[async_trait]
pub trait ThemeRepository: Send + Sync {
    /// List all theme categories in display order
    async fn list_categories(&self) -> DbResult<Vec<ThemeCategoryRow>>;
}

/// Illustration cache repository trait
#[async_trait]
pub trait IllustrationCacheRepository: Send + Sync {
    /// Look up an illustration cached at or after `fresh_since`
    async fn find(
        &self,
        content_hash: &str,
        fresh_since: DateTime<Utc>,
    ) -> DbResult<Option<IllustrationRow>>;

    /// Store an illustration
    ///
    /// An entry for the hash cached at or after `fresh_since` wins; an older
    /// one is replaced.
    async fn insert(
        &self,
        content_hash: &str,
        image_url: &str,
        prompt: &str,
        fresh_since: DateTime<Utc>,
    ) -> DbResult<IllustrationRow>;
}

/// Profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Delete a profile
    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}

/// Keyed counters with explicit expiry, shared by every service instance
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Count one hit for `key` in the current window
    ///
    /// Starts a new window of length `window` when none is active. Returns the
    /// count including this hit and the window expiry.
    async fn hit(&self, key: &str, window: Duration) -> DbResult<RateLimitRow>;

    /// Delete expired windows
    async fn purge_expired(&self) -> DbResult<u64>;
}

/// Database connectivity check
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    /// Round-trip to the database
    async fn ping(&self) -> DbResult<()>;
}

/// All repositories behind trait objects
#[derive(Clone)]
pub struct Stores {
    pub stories: Arc<dyn StoryRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub usage: Arc<dyn UsageRepository>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub themes: Arc<dyn ThemeRepository>,
    pub illustrations: Arc<dyn IllustrationCacheRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub rate_limits: Arc<dyn RateLimitRepository>,
    pub health: Arc<dyn DatabaseHealth>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
