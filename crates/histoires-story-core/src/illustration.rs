//! Cached illustration generation
//!
//! Illustrations are keyed by a SHA-256 hash of the style and text. Image
//! URLs handed out by the provider are temporary, so a cached entry is only
//! reused while its URL is still live; after that the page is drawn again.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use histoires_db::IllustrationCacheRepository;

use crate::provider::ImageProvider;
use crate::GenerationError;

/// Longest text excerpt sent to the image model, in characters
pub const MAX_SCENE_CHARS: usize = 800;

/// Seconds a generated image URL is served from the cache
///
/// Kept below the provider's one-hour URL expiry.
pub const IMAGE_URL_LIFETIME_SECS: i64 = 50 * 60;

/// Style used when the request does not name one
pub const DEFAULT_STYLE: &str = "aquarelle douce et colorée";

/// Generated or cached illustration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Illustration {
    pub image_url: String,
    pub content_hash: String,
    /// Served from the cache without calling the provider
    pub cached: bool,
}

/// Content hash of an illustration request
pub fn content_hash(text: &str, style: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(style.map(str::trim).unwrap_or(DEFAULT_STYLE).as_bytes());
    hasher.update([0u8]);
    hasher.update(text.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Child-safe image prompt for a scene
pub fn illustration_prompt(text: &str, style: Option<&str>) -> String {
    let scene: String = text.trim().chars().take(MAX_SCENE_CHARS).collect();
    let style = style.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_STYLE);
    format!(
        "Illustration de livre pour enfants, style {style}. \
         Scène : {scene}\n\
         Image douce et rassurante, adaptée aux jeunes enfants, sans texte ni lettres, \
         sans violence, sans éléments effrayants."
    )
}

/// Illustration service over an image provider and the hash cache
#[derive(Clone)]
pub struct IllustrationService {
    images: Arc<dyn ImageProvider>,
    cache: Arc<dyn IllustrationCacheRepository>,
    url_lifetime: TimeDelta,
}

impl IllustrationService {
    pub fn new(images: Arc<dyn ImageProvider>, cache: Arc<dyn IllustrationCacheRepository>) -> Self {
        Self {
            images,
            cache,
            url_lifetime: TimeDelta::seconds(IMAGE_URL_LIFETIME_SECS),
        }
    }

    /// Oldest cache entry whose URL is still served
    fn fresh_since(&self) -> DateTime<Utc> {
        Utc::now()
            .checked_sub_signed(self.url_lifetime)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Return the cached illustration for the text, or generate and cache one
    #[instrument(skip(self, text))]
    pub async fn illustrate(
        &self,
        text: &str,
        style: Option<&str>,
    ) -> Result<Illustration, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::MissingField("text"));
        }
        let style = style.map(str::trim).filter(|s| !s.is_empty());
        let hash = content_hash(text, style);
        let fresh_since = self.fresh_since();

        if let Some(row) = self.cache.find(&hash, fresh_since).await? {
            debug!(hash = %hash, "Illustration cache hit");
            return Ok(Illustration {
                image_url: row.image_url,
                content_hash: hash,
                cached: true,
            });
        }

        let prompt = illustration_prompt(text, style);
        let url = self.images.generate_image(&prompt).await?;
        // A concurrent request may have stored the hash first; keep that one.
        let row = self.cache.insert(&hash, &url, &prompt, fresh_since).await?;

        Ok(Illustration {
            image_url: row.image_url,
            content_hash: hash,
            cached: false,
        })
    }
}

impl std::fmt::Debug for IllustrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IllustrationService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_style_sensitive() {
        let a = content_hash("Emma rencontre un dinosaure.", None);
        assert_eq!(a, content_hash("  Emma rencontre un dinosaure. ", None));
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash("Emma rencontre un dinosaure.", Some("crayon")));
    }

    #[test]
    fn test_default_style_matches_explicit_default() {
        assert_eq!(
            content_hash("x", None),
            content_hash("x", Some(DEFAULT_STYLE))
        );
    }

    #[test]
    fn test_prompt_truncates_scene() {
        let long = "a".repeat(MAX_SCENE_CHARS * 2);
        let prompt = illustration_prompt(&long, None);
        assert!(prompt.contains(DEFAULT_STYLE));
        assert!(prompt.matches('a').count() < MAX_SCENE_CHARS + 200);
        assert!(prompt.contains("sans texte"));
    }
}
