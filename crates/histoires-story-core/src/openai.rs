//! OpenAI client: moderation, chat completions and image generation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};

use crate::provider::{
    Completion, CompletionProvider, ImageProvider, Moderation, ModerationProvider,
};
use crate::GenerationError;

/// Public OpenAI API endpoint
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Sampling temperature for stories
pub const TEMPERATURE: f64 = 0.7;

/// Completion token cap for stories
pub const MAX_TOKENS: u32 = 1200;

/// Sequences that end a story early
pub const STOP_SEQUENCES: [&str; 2] = ["\n\n\n", "FIN DE L'HISTOIRE"];

/// Generated image size
pub const IMAGE_SIZE: &str = "1024x1024";

const PROVIDER: &str = "OpenAI";

/// OpenAI client configuration
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: OPENAI_API_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

/// OpenAI HTTP client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// POST a JSON body and decode the JSON answer
    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T, GenerationError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey("OPENAI_API_KEY"))?;
        let url = format!("{}{endpoint}", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, endpoint, "OpenAI request failed");
                GenerationError::Provider {
                    provider: PROVIDER,
                    status: None,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, endpoint, "OpenAI API error");
            let message = serde_json::from_str::<OpenAiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(GenerationError::Provider {
                provider: PROVIDER,
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| GenerationError::InvalidResponse {
            provider: PROVIDER,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ModerationProvider for OpenAiClient {
    #[instrument(skip(self, input), fields(len = input.len()))]
    async fn moderate(&self, input: &str) -> Result<Moderation, GenerationError> {
        let response: ModerationResponse = self
            .post_json("/moderations", json!({ "input": input }))
            .await?;

        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse {
                provider: PROVIDER,
                message: "moderation returned no result".to_string(),
            })?;

        let categories = result
            .categories
            .into_iter()
            .filter_map(|(name, flagged)| flagged.then_some(name))
            .collect();
        debug!(flagged = result.flagged, "Moderation verdict");

        Ok(Moderation {
            flagged: result.flagged,
            categories,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    #[instrument(skip(self, system, user), fields(model = %self.config.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<Completion, GenerationError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "stop": STOP_SEQUENCES,
        });

        let response: ChatResponse = self.post_json("/chat/completions", body).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GenerationError::InvalidResponse {
                provider: PROVIDER,
                message: "completion is empty".to_string(),
            })?;

        Ok(Completion {
            text,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAiClient {
    #[instrument(skip(self, prompt))]
    async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.config.image_model,
            "prompt": prompt,
            "n": 1,
            "size": IMAGE_SIZE,
        });

        let response: ImageResponse = self.post_json("/images/generations", body).await?;
        response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| GenerationError::InvalidResponse {
                provider: PROVIDER,
                message: "image response has no URL".to_string(),
            })
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: std::collections::BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}
