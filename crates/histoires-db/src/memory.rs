//! In-memory repositories
//!
//! A single [`MemoryStore`] implements every repository trait on top of
//! `DashMap`s. Used by service tests in place of Postgres.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::types::Json;
use uuid::Uuid;

use histoires_types::{ThemeCategory, UsageAction};

use crate::error::{DbError, DbResult};
use crate::models::*;
use crate::repo::*;

/// In-memory backing for every repository
#[derive(Default)]
pub struct MemoryStore {
    stories: DashMap<Uuid, StoryRow>,
    favorites: DashMap<(Uuid, Uuid), FavoriteRow>,
    usage: DashMap<(Uuid, String), UsageRow>,
    subscribers: DashMap<String, SubscriberRow>,
    themes: DashMap<i32, ThemeCategoryRow>,
    illustrations: DashMap<String, IllustrationRow>,
    profiles: DashMap<Uuid, ProfileRow>,
    rate_limits: DashMap<String, RateLimitRow>,
}

impl MemoryStore {
    /// Create an empty store and the matching [`Stores`] bundle
    pub fn new() -> (Arc<Self>, Stores) {
        let store = Arc::new(Self::default());
        let stores = Stores {
            stories: store.clone(),
            favorites: store.clone(),
            usage: store.clone(),
            subscribers: store.clone(),
            themes: store.clone(),
            illustrations: store.clone(),
            profiles: store.clone(),
            rate_limits: store.clone(),
            health: store.clone(),
        };
        (store, stores)
    }

    /// Insert a story row directly
    pub fn insert_story(&self, row: StoryRow) {
        self.stories.insert(row.id, row);
    }

    /// Insert a subscriber row directly
    pub fn insert_subscriber(&self, row: SubscriberRow) {
        self.subscribers.insert(row.email.clone(), row);
    }

    /// Insert a profile row directly
    pub fn insert_profile(&self, row: ProfileRow) {
        self.profiles.insert(row.id, row);
    }

    /// Overwrite a user's counters for a period
    pub fn set_usage(&self, user_id: Uuid, period: &str, stories: i32, downloads: i32, audio: i32) {
        self.usage.insert(
            (user_id, period.to_string()),
            UsageRow {
                user_id,
                period: period.to_string(),
                stories_count: stories,
                downloads_count: downloads,
                audio_count: audio,
                updated_at: Utc::now(),
            },
        );
    }

    /// Add a theme category at the end of the display order
    pub fn insert_theme_category(&self, category: ThemeCategory) {
        let position = i32::try_from(self.themes.len()).unwrap_or(i32::MAX);
        self.themes.insert(
            category.id,
            ThemeCategoryRow {
                id: category.id,
                name: category.name,
                icon: category.icon,
                themes: Json(category.themes),
                position,
            },
        );
    }

    /// Number of stored stories
    pub fn story_count(&self) -> usize {
        self.stories.len()
    }

    /// Insert a cached illustration row directly
    pub fn insert_illustration(&self, row: IllustrationRow) {
        self.illustrations.insert(row.content_hash.clone(), row);
    }

    /// Number of cached illustrations
    pub fn illustration_count(&self) -> usize {
        self.illustrations.len()
    }
}

fn page<T>(mut rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    if offset >= rows.len() {
        return Vec::new();
    }
    rows.drain(..offset);
    rows.truncate(limit);
    rows
}

fn newest_first(rows: &mut [StoryRow]) {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl StoryRepository for MemoryStore {
    async fn create(&self, story: CreateStory) -> DbResult<StoryRow> {
        let now = Utc::now();
        let row = StoryRow {
            id: story.id,
            owner_id: story.owner_id,
            title: story.title,
            theme: story.theme,
            tone: story.tone,
            child_name: story.child_name,
            child_age: story.child_age,
            content: story.content,
            illustration_url: None,
            audio_url: None,
            is_public: false,
            created_at: now,
            updated_at: now,
        };
        self.stories.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<StoryRow>> {
        Ok(self.stories.get(&id).map(|r| r.value().clone()))
    }

    async fn list_public(&self, limit: i64, offset: i64) -> DbResult<Vec<StoryRow>> {
        let mut rows: Vec<StoryRow> = self
            .stories
            .iter()
            .filter(|r| r.is_public)
            .map(|r| r.value().clone())
            .collect();
        newest_first(&mut rows);
        Ok(page(rows, limit, offset))
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<StoryRow>> {
        let mut rows: Vec<StoryRow> = self
            .stories
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.value().clone())
            .collect();
        newest_first(&mut rows);
        Ok(page(rows, limit, offset))
    }

    async fn set_public(
        &self,
        id: Uuid,
        owner_id: Uuid,
        is_public: bool,
    ) -> DbResult<Option<StoryRow>> {
        match self.stories.get_mut(&id) {
            Some(mut story) if story.owner_id == owner_id => {
                story.is_public = is_public;
                story.updated_at = Utc::now();
                Ok(Some(story.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn attach_media(
        &self,
        id: Uuid,
        owner_id: Uuid,
        media: AttachMedia,
    ) -> DbResult<Option<StoryRow>> {
        match self.stories.get_mut(&id) {
            Some(mut story) if story.owner_id == owner_id => {
                if let Some(url) = media.illustration_url {
                    story.illustration_url = Some(url);
                }
                if let Some(url) = media.audio_url {
                    story.audio_url = Some(url);
                }
                story.updated_at = Utc::now();
                Ok(Some(story.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> DbResult<bool> {
        let removed = self
            .stories
            .remove_if(&id, |_, story| story.owner_id == owner_id)
            .is_some();
        if removed {
            self.favorites.retain(|(_, story_id), _| *story_id != id);
        }
        Ok(removed)
    }

    async fn delete_all_for_owner(&self, owner_id: Uuid) -> DbResult<u64> {
        let ids: Vec<Uuid> = self
            .stories
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.id)
            .collect();
        for id in &ids {
            self.stories.remove(id);
        }
        self.favorites.retain(|(_, story_id), _| !ids.contains(story_id));
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<FavoriteRow>> {
        let mut rows: Vec<FavoriteRow> = self
            .favorites
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn add(&self, user_id: Uuid, story_id: Uuid, display_name: &str) -> DbResult<FavoriteRow> {
        if !self.stories.contains_key(&story_id) {
            return Err(DbError::NotFound);
        }
        let mut entry = self
            .favorites
            .entry((user_id, story_id))
            .or_insert_with(|| FavoriteRow {
                user_id,
                story_id,
                display_name: String::new(),
                created_at: Utc::now(),
            });
        entry.display_name = display_name.to_string();
        Ok(entry.clone())
    }

    async fn remove(&self, user_id: Uuid, story_id: Uuid) -> DbResult<bool> {
        Ok(self.favorites.remove(&(user_id, story_id)).is_some())
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let before = self.favorites.len();
        self.favorites.retain(|(owner, _), _| *owner != user_id);
        Ok((before - self.favorites.len()) as u64)
    }
}

#[async_trait]
impl UsageRepository for MemoryStore {
    async fn get(&self, user_id: Uuid, period: &str) -> DbResult<Option<UsageRow>> {
        Ok(self
            .usage
            .get(&(user_id, period.to_string()))
            .map(|r| r.value().clone()))
    }

    async fn try_increment(
        &self,
        user_id: Uuid,
        period: &str,
        action: UsageAction,
        limit: Option<u32>,
    ) -> DbResult<Option<UsageRow>> {
        if limit == Some(0) {
            return Ok(None);
        }

        // The entry guard holds the shard lock across check and increment.
        let mut row = self
            .usage
            .entry((user_id, period.to_string()))
            .or_insert_with(|| UsageRow {
                user_id,
                period: period.to_string(),
                stories_count: 0,
                downloads_count: 0,
                audio_count: 0,
                updated_at: Utc::now(),
            });
        let counter = match action {
            UsageAction::CreateStory => &mut row.stories_count,
            UsageAction::Download => &mut row.downloads_count,
            UsageAction::GenerateAudio => &mut row.audio_count,
        };
        if let Some(limit) = limit {
            if i64::from(*counter) >= i64::from(limit) {
                return Ok(None);
            }
        }
        *counter += 1;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
}

#[async_trait]
impl SubscriberRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> DbResult<Option<SubscriberRow>> {
        Ok(self.subscribers.get(email).map(|r| r.value().clone()))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriberRow>> {
        Ok(self
            .subscribers
            .iter()
            .filter(|r| r.user_id == Some(user_id))
            .max_by_key(|r| r.updated_at)
            .map(|r| r.value().clone()))
    }

    async fn upsert(&self, sub: UpsertSubscriber) -> DbResult<SubscriberRow> {
        let previous_user = self.subscribers.get(&sub.email).and_then(|r| r.user_id);
        let row = SubscriberRow {
            email: sub.email.clone(),
            user_id: sub.user_id.or(previous_user),
            subscribed: sub.subscribed,
            subscription_tier: sub.subscription_tier,
            subscription_end: sub.subscription_end,
            stripe_customer_id: sub.stripe_customer_id,
            updated_at: Utc::now(),
        };
        self.subscribers.insert(sub.email, row.clone());
        Ok(row)
    }
}

#[async_trait]
impl ThemeRepository for MemoryStore {
    async fn list_categories(&self) -> DbResult<Vec<ThemeCategoryRow>> {
        let mut rows: Vec<ThemeCategoryRow> = self.themes.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|r| (r.position, r.id));
        Ok(rows)
    }
}

#[async_trait]
impl IllustrationCacheRepository for MemoryStore {
    async fn find(
        &self,
        content_hash: &str,
        fresh_since: DateTime<Utc>,
    ) -> DbResult<Option<IllustrationRow>> {
        Ok(self
            .illustrations
            .get(content_hash)
            .filter(|r| r.created_at >= fresh_since)
            .map(|r| r.value().clone()))
    }

    async fn insert(
        &self,
        content_hash: &str,
        image_url: &str,
        prompt: &str,
        fresh_since: DateTime<Utc>,
    ) -> DbResult<IllustrationRow> {
        let new_row = || IllustrationRow {
            content_hash: content_hash.to_string(),
            image_url: image_url.to_string(),
            prompt: prompt.to_string(),
            created_at: Utc::now(),
        };
        let mut row = self
            .illustrations
            .entry(content_hash.to_string())
            .or_insert_with(new_row);
        if row.created_at < fresh_since {
            *row = new_row();
        }
        Ok(row.value().clone())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        Ok(self.profiles.remove(&id).is_some())
    }
}

#[async_trait]
impl RateLimitRepository for MemoryStore {
    async fn hit(&self, key: &str, window: Duration) -> DbResult<RateLimitRow> {
        let now = Utc::now();
        let window = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::zero());
        let mut row = self
            .rate_limits
            .entry(key.to_string())
            .or_insert_with(|| RateLimitRow {
                key: key.to_string(),
                count: 0,
                expires_at: now + window,
            });
        if row.expires_at <= now {
            row.count = 0;
            row.expires_at = now + window;
        }
        row.count += 1;
        Ok(row.clone())
    }

    async fn purge_expired(&self) -> DbResult<u64> {
        let now = Utc::now();
        let before = self.rate_limits.len();
        self.rate_limits.retain(|_, row| row.expires_at > now);
        Ok((before - self.rate_limits.len()) as u64)
    }
}

#[async_trait]
impl DatabaseHealth for MemoryStore {
    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}
