//! Story and favorite types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Unique story identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub Uuid);

impl StoryId {
    /// Create a new random story ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for StoryId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A generated story
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    /// The only user allowed to modify the story
    pub owner_id: UserId,
    pub title: String,
    /// Theme key the story was generated from
    pub theme: String,
    pub tone: Option<String>,
    pub child_name: String,
    pub child_age: u8,
    pub content: String,
    pub illustration_url: Option<String>,
    pub audio_url: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Whether `viewer` may read this story
    pub fn is_visible_to(&self, viewer: Option<&UserId>) -> bool {
        self.is_public || viewer.is_some_and(|v| *v == self.owner_id)
    }

    /// Whether `user` owns this story
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == *user
    }
}

/// A bookmarked story
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_id: UserId,
    pub story_id: StoryId,
    /// Name shown in the favorites list
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(owner: UserId, is_public: bool) -> Story {
        Story {
            id: StoryId::new(),
            owner_id: owner,
            title: "L'aventure d'Emma".to_string(),
            theme: "dinosaures".to_string(),
            tone: None,
            child_name: "Emma".to_string(),
            child_age: 6,
            content: "Il était une fois.".to_string(),
            illustration_url: None,
            audio_url: None,
            is_public,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_private_story_visible_only_to_owner() {
        let owner = UserId::new();
        let s = story(owner, false);
        assert!(s.is_visible_to(Some(&owner)));
        assert!(!s.is_visible_to(Some(&UserId::new())));
        assert!(!s.is_visible_to(None));
    }

    #[test]
    fn test_public_story_visible_to_anyone() {
        let s = story(UserId::new(), true);
        assert!(s.is_visible_to(None));
        assert!(!s.is_owned_by(&UserId::new()));
    }
}
