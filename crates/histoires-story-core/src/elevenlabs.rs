//! ElevenLabs text-to-speech client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{error, instrument};

use crate::provider::{SpeechAudio, SpeechProvider};
use crate::GenerationError;

/// Public ElevenLabs API endpoint
pub const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";

/// Multilingual model, needed for French narration
pub const TTS_MODEL: &str = "eleven_multilingual_v2";

/// Longest text accepted for one narration, in characters
pub const MAX_TTS_CHARS: usize = 5_000;

const PROVIDER: &str = "ElevenLabs";

/// ElevenLabs client configuration
#[derive(Clone)]
pub struct ElevenLabsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Voice used when the request does not name one
    pub default_voice_id: String,
    pub timeout: Duration,
}

impl ElevenLabsConfig {
    pub fn new(api_key: Option<String>, default_voice_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: ELEVENLABS_API_BASE.to_string(),
            default_voice_id: default_voice_id.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("default_voice_id", &self.default_voice_id)
            .finish()
    }
}

/// ElevenLabs HTTP client
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsClient {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<SpeechAudio, GenerationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::MissingField("text"));
        }
        if text.chars().count() > MAX_TTS_CHARS {
            return Err(GenerationError::InvalidInput(format!(
                "text must be at most {MAX_TTS_CHARS} characters"
            )));
        }
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey("ELEVENLABS_API_KEY"))?;

        let voice = voice_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.config.default_voice_id);
        let url = format!("{}/text-to-speech/{voice}", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": TTS_MODEL,
                "voice_settings": { "stability": 0.5, "similarity_boost": 0.75 },
            }))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "ElevenLabs request failed");
                GenerationError::Provider {
                    provider: PROVIDER,
                    status: None,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, "ElevenLabs API error");
            return Err(GenerationError::Provider {
                provider: PROVIDER,
                status: Some(status.as_u16()),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response.bytes().await.map_err(|e| GenerationError::InvalidResponse {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        Ok(SpeechAudio {
            bytes,
            content_type,
        })
    }
}

impl std::fmt::Debug for ElevenLabsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
