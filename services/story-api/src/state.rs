//! Application state for the Story API service.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use histoires_auth::TokenValidator;
use histoires_billing_core::{QuotaGate, StripeProvider, SubscriptionService};
use histoires_db::Stores;
use histoires_story_core::{
    ElevenLabsClient, IllustrationService, OpenAiClient, PromptCatalog, SpeechProvider,
    StoryGenerator,
};
use histoires_types::ThemeCategory;

use crate::config::{Config, ConfigError};
use crate::rate_limit::RateLimiter;

/// How long the theme catalog is served from memory
const THEME_CACHE_TTL: Duration = Duration::from_secs(300);

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Repositories
    pub stores: Stores,
    /// Bearer token validation
    pub validator: Arc<TokenValidator>,
    /// Moderated story generation
    pub generator: StoryGenerator,
    /// Cached illustration generation
    pub illustrations: IllustrationService,
    /// Narration synthesis
    pub speech: Arc<dyn SpeechProvider>,
    /// Stripe-backed subscription state
    pub subscriptions: SubscriptionService,
    /// Monthly usage limits
    pub quota: QuotaGate,
    /// Story generation rate limit
    pub rate_limiter: RateLimiter,
    /// Theme categories, keyed by the unit value
    pub themes: Cache<(), Arc<Vec<ThemeCategory>>>,
    /// SPA index document served on client routes
    pub spa_index: Option<Arc<str>>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire providers and services from configuration
    pub fn new(config: Config, stores: Stores) -> Result<Self, ConfigError> {
        let catalog = match &config.prompt_catalog_path {
            Some(path) => PromptCatalog::from_json_file(path)?,
            None => PromptCatalog::default(),
        };
        catalog.validate()?;

        let validator = TokenValidator::new(&config.auth)?;

        let openai = Arc::new(OpenAiClient::new(config.openai.clone()));
        let generator = StoryGenerator::new(openai.clone(), openai.clone(), Arc::new(catalog));
        let illustrations = IllustrationService::new(openai, stores.illustrations.clone());
        let speech = Arc::new(ElevenLabsClient::new(config.elevenlabs.clone()));

        let stripe = Arc::new(StripeProvider::new(config.billing.clone()));
        let subscriptions =
            SubscriptionService::new(stripe, stores.subscribers.clone(), config.billing.clone());
        let quota = QuotaGate::new(stores.usage.clone(), config.usage_limits.clone());
        let rate_limiter = RateLimiter::new(
            stores.rate_limits.clone(),
            config.story_rate_limit,
            config.story_rate_window,
        );

        let themes = Cache::builder()
            .time_to_live(THEME_CACHE_TTL)
            .max_capacity(1)
            .build();

        Ok(Self {
            stores,
            validator: Arc::new(validator),
            generator,
            illustrations,
            speech,
            subscriptions,
            quota,
            rate_limiter,
            themes,
            spa_index: None,
            config: Arc::new(config),
        })
    }

    /// Serve this document on client routes
    pub fn with_spa_index(mut self, index: impl Into<Arc<str>>) -> Self {
        self.spa_index = Some(index.into());
        self
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
