//! Generation errors

use thiserror::Error;

/// Errors from story, image and speech generation
#[derive(Error, Debug)]
pub enum GenerationError {
    /// A required input field is missing or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// An input field is present but unusable
    #[error("{0}")]
    InvalidInput(String),

    /// Provider key not configured
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    /// Provider returned an error or could not be reached
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Provider answered 2xx with an unusable body
    #[error("{provider} returned an unexpected response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] histoires_db::DbError),
}

impl GenerationError {
    /// Whether the caller sent bad input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidInput(_))
    }

    /// Provider error category, chosen from the error message
    pub fn category(&self) -> ProviderErrorCategory {
        match self {
            Self::MissingApiKey(_) => ProviderErrorCategory::ApiKeyMissing,
            Self::Provider {
                status: Some(401), ..
            } => ProviderErrorCategory::ApiKeyInvalid,
            Self::Provider {
                status: Some(429),
                message,
                ..
            } if !message.to_lowercase().contains("key") => ProviderErrorCategory::QuotaExceeded,
            other => ProviderErrorCategory::classify(&other.to_string()),
        }
    }
}

/// Coarse category of a provider failure, surfaced to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCategory {
    ApiKeyMissing,
    ApiKeyInvalid,
    QuotaExceeded,
    Generic,
}

impl ProviderErrorCategory {
    /// Classify by substring matching on the error message
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        let mentions_key = message.contains("api key") || message.contains("api_key");

        if mentions_key
            && (message.contains("not set")
                || message.contains("missing")
                || message.contains("not configured"))
        {
            Self::ApiKeyMissing
        } else if (mentions_key
            && (message.contains("invalid") || message.contains("incorrect")))
            || message.contains("unauthorized")
        {
            Self::ApiKeyInvalid
        } else if message.contains("quota")
            || message.contains("rate limit")
            || message.contains("billing")
        {
            Self::QuotaExceeded
        } else {
            Self::Generic
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKeyMissing => "api_key_missing",
            Self::ApiKeyInvalid => "api_key_invalid",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for ProviderErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_messages() {
        use ProviderErrorCategory::*;
        assert_eq!(
            ProviderErrorCategory::classify("OPENAI_API_KEY is not set"),
            ApiKeyMissing
        );
        assert_eq!(ProviderErrorCategory::classify("API key is missing"), ApiKeyMissing);
        assert_eq!(
            ProviderErrorCategory::classify("Incorrect API key provided: sk-****"),
            ApiKeyInvalid
        );
        assert_eq!(
            ProviderErrorCategory::classify("You exceeded your current quota"),
            QuotaExceeded
        );
        assert_eq!(ProviderErrorCategory::classify("connection reset"), Generic);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            GenerationError::MissingApiKey("OPENAI_API_KEY").category(),
            ProviderErrorCategory::ApiKeyMissing
        );
        let unauthorized = GenerationError::Provider {
            provider: "OpenAI",
            status: Some(401),
            message: "bad".to_string(),
        };
        assert_eq!(unauthorized.category(), ProviderErrorCategory::ApiKeyInvalid);
        let throttled = GenerationError::Provider {
            provider: "OpenAI",
            status: Some(429),
            message: "Rate limit reached".to_string(),
        };
        assert_eq!(throttled.category(), ProviderErrorCategory::QuotaExceeded);
    }

    #[test]
    fn test_validation_errors() {
        assert!(GenerationError::MissingField("childName").is_validation());
        assert!(!GenerationError::MissingApiKey("X").is_validation());
        assert_eq!(
            GenerationError::MissingField("childName").to_string(),
            "childName is required"
        );
    }
}
