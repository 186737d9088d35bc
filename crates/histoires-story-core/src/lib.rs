//! Histoires Story Core - Story generation and reading
//!
//! Provider clients (OpenAI moderation, chat and images; ElevenLabs speech),
//! the moderated generation lifecycle, the prompt catalog, and the pure
//! reading logic (pagination and the page-flip state machine).
//!
//! # Example
//!
//! ```rust,ignore
//! use histoires_story_core::{OpenAiClient, OpenAiConfig, PromptCatalog, StoryGenerator, StoryRequest};
//!
//! let openai = Arc::new(OpenAiClient::new(OpenAiConfig::new(api_key)));
//! let generator = StoryGenerator::new(openai.clone(), openai, Arc::new(PromptCatalog::default()));
//!
//! let story = generator.generate(&request).await?;
//! let pages = paginate(&story.story);
//! ```

pub mod catalog;
pub mod elevenlabs;
pub mod error;
pub mod generator;
pub mod illustration;
pub mod openai;
pub mod pagination;
pub mod prompt;
pub mod provider;
pub mod reader;

pub use catalog::{CatalogEntry, CatalogError, PromptCatalog};
pub use elevenlabs::{ElevenLabsClient, ElevenLabsConfig};
pub use error::{GenerationError, ProviderErrorCategory};
pub use generator::{GeneratedStory, StoryGenerator, StoryMetadata, REFUSAL_MESSAGE};
pub use illustration::{Illustration, IllustrationService};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use pagination::{paginate, split_sentences, StoryPage, SENTENCES_PER_PAGE};
pub use prompt::{AgeBracket, StoryRequest};
pub use provider::{
    Completion, CompletionProvider, ImageProvider, Moderation, ModerationProvider, SpeechAudio,
    SpeechProvider,
};
pub use reader::{Reader, ReaderState};
