//! Moderated story generation
//!
//! Input moderation, generation and output moderation run in sequence. A
//! flagged input or output yields the canned refusal, never an error, and
//! the generator is not called for a flagged input.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::prompt::{user_prompt, AgeBracket, StoryRequest, SYSTEM_PROMPT};
use crate::provider::{CompletionProvider, ModerationProvider};
use crate::{GenerationError, PromptCatalog};

/// Story returned in place of flagged content
pub const REFUSAL_MESSAGE: &str = "Je ne peux pas écrire cette histoire, mais je peux t'en \
raconter une autre ! Essaie un autre thème ou d'autres détails, et une nouvelle aventure \
t'attendra.";

/// Generation details returned with a story
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetadata {
    pub theme: String,
    pub tone: Option<String>,
    pub child_age: u8,
    pub age_bracket: AgeBracket,
    /// Model that wrote the story; absent for refusals
    pub model: Option<String>,
    pub word_count: usize,
}

/// Result of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStory {
    pub title: String,
    pub story: String,
    pub blocked: bool,
    pub metadata: StoryMetadata,
}

/// Story generator
#[derive(Clone)]
pub struct StoryGenerator {
    moderation: Arc<dyn ModerationProvider>,
    completion: Arc<dyn CompletionProvider>,
    catalog: Arc<PromptCatalog>,
}

impl StoryGenerator {
    pub fn new(
        moderation: Arc<dyn ModerationProvider>,
        completion: Arc<dyn CompletionProvider>,
        catalog: Arc<PromptCatalog>,
    ) -> Self {
        Self {
            moderation,
            completion,
            catalog,
        }
    }

    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    /// Run the full lifecycle for one request
    #[instrument(skip(self, request), fields(theme = %request.theme, age = request.child_age))]
    pub async fn generate(&self, request: &StoryRequest) -> Result<GeneratedStory, GenerationError> {
        request.validate()?;

        let verdict = self.moderation.moderate(&request.moderation_input()).await?;
        if verdict.flagged {
            warn!(categories = ?verdict.categories, "Story request flagged by moderation");
            return Ok(refusal(request));
        }

        let prompt = user_prompt(request, &self.catalog);
        let completion = self.completion.complete(SYSTEM_PROMPT, &prompt).await?;

        let verdict = self.moderation.moderate(&completion.text).await?;
        if verdict.flagged {
            warn!(categories = ?verdict.categories, "Generated story flagged by moderation");
            return Ok(refusal(request));
        }

        let (title, story) = split_title(&completion.text, request.name());
        let word_count = story.split_whitespace().count();
        info!(word_count, "Story generated");

        Ok(GeneratedStory {
            title,
            story,
            blocked: false,
            metadata: metadata(request, Some(completion.model), word_count),
        })
    }
}

impl std::fmt::Debug for StoryGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryGenerator").finish_non_exhaustive()
    }
}

fn metadata(request: &StoryRequest, model: Option<String>, word_count: usize) -> StoryMetadata {
    StoryMetadata {
        theme: request.theme.trim().to_string(),
        tone: request.tone_key().map(str::to_string),
        child_age: request.child_age,
        age_bracket: AgeBracket::from_age(request.child_age),
        model,
        word_count,
    }
}

fn refusal(request: &StoryRequest) -> GeneratedStory {
    GeneratedStory {
        title: format!("Une nouvelle aventure pour {}", request.name()),
        story: REFUSAL_MESSAGE.to_string(),
        blocked: true,
        metadata: metadata(request, None, REFUSAL_MESSAGE.split_whitespace().count()),
    }
}

/// Separate the `Titre :` line from the body
///
/// The title always contains the child name; otherwise the default title is
/// used.
pub fn split_title(text: &str, child_name: &str) -> (String, String) {
    let fallback = format!("L'aventure de {child_name}");
    let text = text.trim();
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));

    let Some(title) = parse_title_line(first) else {
        return (fallback, text.to_string());
    };
    let body = rest.trim().to_string();

    if title.to_lowercase().contains(&child_name.to_lowercase()) {
        (title, body)
    } else {
        (fallback, body)
    }
}

fn parse_title_line(line: &str) -> Option<String> {
    let line = line.trim().trim_start_matches('#').trim().trim_matches('*').trim();
    let lower = line.to_lowercase();
    if !lower.starts_with("titre") {
        return None;
    }
    let after = line.get("titre".len()..)?.trim_start();
    let title = after.strip_prefix(':')?;
    let title = title
        .trim()
        .trim_matches(|c| matches!(c, '"' | '«' | '»' | '*'))
        .trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_line_is_extracted() {
        let (title, body) = split_title(
            "Titre : Emma et le dinosaure timide\nIl était une fois Emma.",
            "Emma",
        );
        assert_eq!(title, "Emma et le dinosaure timide");
        assert_eq!(body, "Il était une fois Emma.");
    }

    #[test]
    fn test_markdown_title_with_quotes() {
        let (title, _) = split_title("**Titre : « Le voyage d'Emma »**\n\nTexte.", "Emma");
        assert_eq!(title, "Le voyage d'Emma");
    }

    #[test]
    fn test_title_without_name_falls_back() {
        let (title, body) = split_title("Titre : Le dinosaure timide\nTexte.", "Emma");
        assert_eq!(title, "L'aventure de Emma");
        assert_eq!(body, "Texte.");
    }

    #[test]
    fn test_missing_title_keeps_whole_text() {
        let (title, body) = split_title("Il était une fois Emma.\nFin.", "Emma");
        assert_eq!(title, "L'aventure de Emma");
        assert_eq!(body, "Il était une fois Emma.\nFin.");
    }

    #[test]
    fn test_empty_title_falls_back() {
        let (title, _) = split_title("Titre :\nTexte.", "Emma");
        assert_eq!(title, "L'aventure de Emma");
    }
}
