//! Provider abstractions
//!
//! One trait per external capability, so the generation lifecycle can be
//! driven by any backend.

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;

use crate::GenerationError;

/// Moderation verdict
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Moderation {
    pub flagged: bool,
    /// Names of the flagged categories
    pub categories: Vec<String>,
}

/// A chat completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Model that produced the text
    pub model: String,
}

/// Synthesized speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub bytes: Bytes,
    pub content_type: String,
}

impl SpeechAudio {
    /// Standard base64 of the audio bytes
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Content moderation
#[async_trait]
pub trait ModerationProvider: Send + Sync {
    async fn moderate(&self, input: &str) -> Result<Moderation, GenerationError>;
}

/// Text generation
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<Completion, GenerationError>;
}

/// Image generation
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate one image and return its URL
    async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Text-to-speech
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<SpeechAudio, GenerationError>;
}
