//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use histoires_types::{
    CustomerId, Favorite, Story, StoryId, SubscriptionState, Theme, ThemeCategory, UsageCounters,
    UserId,
};

/// Story row from the database
#[derive(Debug, Clone, FromRow)]
pub struct StoryRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub theme: String,
    pub tone: Option<String>,
    pub child_name: String,
    pub child_age: i16,
    pub content: String,
    pub illustration_url: Option<String>,
    pub audio_url: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Favorite row from the database
#[derive(Debug, Clone, FromRow)]
pub struct FavoriteRow {
    pub user_id: Uuid,
    pub story_id: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Usage counters row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UsageRow {
    pub user_id: Uuid,
    pub period: String,
    pub stories_count: i32,
    pub downloads_count: i32,
    pub audio_count: i32,
    pub updated_at: DateTime<Utc>,
}

/// Subscriber row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriberRow {
    pub email: String,
    pub user_id: Option<Uuid>,
    pub subscribed: bool,
    pub subscription_tier: Option<String>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Theme category row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ThemeCategoryRow {
    pub id: i32,
    pub name: String,
    pub icon: String,
    pub themes: Json<Vec<Theme>>,
    pub position: i32,
}

/// Cached illustration row from the database
#[derive(Debug, Clone, FromRow)]
pub struct IllustrationRow {
    pub content_hash: String,
    pub image_url: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

/// Profile row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rate limit counter row from the database
#[derive(Debug, Clone, FromRow)]
pub struct RateLimitRow {
    pub key: String,
    pub count: i32,
    pub expires_at: DateTime<Utc>,
}

// Conversions from row types to histoires-types domain types

impl StoryRow {
    /// Convert to the domain story
    pub fn into_story(self) -> Story {
        Story {
            id: StoryId(self.id),
            owner_id: UserId(self.owner_id),
            title: self.title,
            theme: self.theme,
            tone: self.tone,
            child_name: self.child_name,
            child_age: u8::try_from(self.child_age).unwrap_or(0),
            content: self.content,
            illustration_url: self.illustration_url,
            audio_url: self.audio_url,
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl FavoriteRow {
    /// Convert to the domain favorite
    pub fn into_favorite(self) -> Favorite {
        Favorite {
            user_id: UserId(self.user_id),
            story_id: StoryId(self.story_id),
            display_name: self.display_name,
            created_at: self.created_at,
        }
    }
}

impl UsageRow {
    /// Counters, clamped to be non-negative
    pub fn counters(&self) -> UsageCounters {
        let clamp = |v: i32| u32::try_from(v).unwrap_or(0);
        UsageCounters {
            stories_count: clamp(self.stories_count),
            downloads_count: clamp(self.downloads_count),
            audio_count: clamp(self.audio_count),
        }
    }
}

impl SubscriberRow {
    /// Convert to the domain subscription state
    ///
    /// An unknown tier label on a subscribed row is kept as `None`; the
    /// effective tier then falls back to the default paid tier.
    pub fn into_state(self) -> SubscriptionState {
        SubscriptionState {
            email: self.email,
            user_id: self.user_id.map(UserId),
            subscribed: self.subscribed,
            tier: self.subscription_tier.and_then(|t| t.parse().ok()),
            subscription_end: self.subscription_end,
            customer_id: self.stripe_customer_id.map(CustomerId),
            updated_at: self.updated_at,
        }
    }
}

impl ThemeCategoryRow {
    /// Convert to the domain theme category
    pub fn into_category(self) -> ThemeCategory {
        ThemeCategory {
            id: self.id,
            name: self.name,
            icon: self.icon,
            themes: self.themes.0,
        }
    }
}
