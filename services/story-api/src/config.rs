//! Configuration for the Story API service.

use std::path::PathBuf;
use std::time::Duration;

use histoires_auth::AuthConfig;
use histoires_billing_core::BillingConfig;
use histoires_story_core::{ElevenLabsConfig, OpenAiConfig};
use histoires_types::{Limit, PriceId, Tier, UsageAction, UsageLimits};

/// Voice used for narration unless configured otherwise
pub const DEFAULT_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";

/// Story API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Database pool size
    pub database_max_connections: u32,
    /// Bearer token validation
    pub auth: AuthConfig,
    /// OpenAI client configuration
    pub openai: OpenAiConfig,
    /// ElevenLabs client configuration
    pub elevenlabs: ElevenLabsConfig,
    /// Billing core configuration
    pub billing: BillingConfig,
    /// Per-tier usage limits
    pub usage_limits: UsageLimits,
    /// Front-end URL
    pub app_url: String,
    /// CORS allow-list; defaults to the front-end origin
    pub allowed_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Apply SQL migrations at startup
    pub run_migrations: bool,
    /// JSON prompt catalog replacing the built-in one
    pub prompt_catalog_path: Option<PathBuf>,
    /// SPA index document served on client routes
    pub spa_index_path: Option<PathBuf>,
    /// Story generations allowed per user per window
    pub story_rate_limit: u32,
    /// Story generation rate limit window
    pub story_rate_window: Duration,
}

impl Config {
    /// Configuration with defaults for everything but the required values
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        let app_url = "http://localhost:5173".to_string();
        Self {
            http_port: 8080,
            database_url: database_url.into(),
            database_max_connections: 10,
            auth: AuthConfig::new(jwt_secret, "authenticated"),
            openai: OpenAiConfig::new(None),
            elevenlabs: ElevenLabsConfig::new(None, DEFAULT_VOICE_ID),
            billing: BillingConfig::new(None).with_app_url(&app_url),
            usage_limits: UsageLimits::default(),
            allowed_origins: vec![app_url.clone()],
            app_url,
            request_timeout: Duration::from_secs(60),
            metrics_enabled: true,
            run_migrations: false,
            prompt_catalog_path: None,
            spa_index_path: None,
            story_rate_limit: 5,
            story_rate_window: Duration::from_secs(60),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Required
        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = var("AUTH_JWT_SECRET").ok_or(ConfigError::Missing("AUTH_JWT_SECRET"))?;
        if jwt_secret.len() < histoires_auth::MIN_SECRET_LEN {
            return Err(ConfigError::Invalid("AUTH_JWT_SECRET"));
        }

        let mut config = Self::new(database_url, jwt_secret);

        // Server
        if let Some(port) = var("HTTP_PORT") {
            config.http_port = port.parse().map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;
        }
        if let Some(size) = var("DATABASE_MAX_CONNECTIONS") {
            config.database_max_connections = size
                .parse()
                .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;
        }
        if let Some(secs) = var("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;
            config.request_timeout = Duration::from_secs(secs);
        }
        config.metrics_enabled = parse_bool(var("METRICS_ENABLED"), true);
        config.run_migrations = parse_bool(var("RUN_MIGRATIONS"), false);

        // Auth
        if let Some(audience) = var("AUTH_JWT_AUDIENCE") {
            config.auth.audience = audience;
        }

        // Front end
        if let Some(app_url) = var("APP_URL") {
            config.app_url = app_url.trim_end_matches('/').to_string();
        }
        config.allowed_origins = match var("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => vec![config.app_url.clone()],
        };
        config.spa_index_path = var("SPA_INDEX_PATH").map(PathBuf::from);

        // OpenAI
        let mut openai = OpenAiConfig::new(var("OPENAI_API_KEY"));
        if let Some(base) = var("OPENAI_BASE_URL") {
            openai = openai.with_base_url(base);
        }
        if let Some(model) = var("OPENAI_MODEL") {
            openai = openai.with_model(model);
        }
        config.openai = openai;
        config.prompt_catalog_path = var("PROMPT_CATALOG_PATH").map(PathBuf::from);

        // ElevenLabs
        let voice = var("ELEVENLABS_VOICE_ID").unwrap_or_else(|| DEFAULT_VOICE_ID.to_string());
        let mut elevenlabs = ElevenLabsConfig::new(var("ELEVENLABS_API_KEY"), voice);
        if let Some(base) = var("ELEVENLABS_BASE_URL") {
            elevenlabs = elevenlabs.with_base_url(base);
        }
        config.elevenlabs = elevenlabs;

        // Stripe
        let mut billing = BillingConfig::new(var("STRIPE_SECRET_KEY"))
            .with_app_url(&config.app_url)
            .with_default_price(var("STRIPE_PRICE_ID").map(PriceId::new));
        if let Some(base) = var("STRIPE_BASE_URL") {
            billing = billing.with_api_base(base);
        }
        config.billing = billing;

        // Usage limits, e.g. LIMIT_FREE_STORIES=10 or LIMIT_BASIC_AUDIO=unlimited
        let mut limits = UsageLimits::default();
        for tier in Tier::ALL {
            for action in UsageAction::ALL {
                let key = format!(
                    "LIMIT_{}_{}",
                    tier.to_string().to_uppercase(),
                    action.as_str().to_uppercase()
                );
                if let Some(value) = var(&key) {
                    let limit: Limit = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue(key.clone()))?;
                    limits = limits.with_limit(tier, action, limit);
                }
            }
        }
        config.usage_limits = limits;

        // Rate limiting
        if let Some(limit) = var("STORY_RATE_LIMIT") {
            config.story_rate_limit = limit
                .parse()
                .map_err(|_| ConfigError::Invalid("STORY_RATE_LIMIT"))?;
        }
        if let Some(secs) = var("STORY_RATE_WINDOW_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ConfigError::Invalid("STORY_RATE_WINDOW_SECS"))?;
            config.story_rate_window = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),

    #[error("Invalid auth configuration: {0}")]
    Auth(#[from] histoires_auth::AuthError),

    #[error("Invalid prompt catalog: {0}")]
    Catalog(#[from] histoires_story_core::CatalogError),
}
