//! JWT access token validation

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use histoires_types::UserId;

use crate::{AuthConfig, AuthError, MIN_SECRET_LEN};

/// Claims carried by an identity provider access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Account email
    pub email: Option<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience
    pub aud: Option<String>,
    /// Provider role (`authenticated`, `anon`, ...)
    pub role: Option<String>,
}

impl AccessClaims {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// The caller identified by a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// HS256 token validator
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    /// Create a validator from config
    ///
    /// Fails when the secret is shorter than [`MIN_SECRET_LEN`].
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "JWT secret must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation.leeway = config.leeway.as_secs();

        Ok(Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }

    /// Validate a token and return the caller
    pub fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let claims = data.claims;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            tracing::debug!("Token subject is not a UUID: {}", claims.sub);
            AuthError::InvalidToken
        })?;

        if claims.role.as_deref() == Some("anon") {
            return Err(AuthError::InvalidToken);
        }

        Ok(AuthenticatedUser {
            user_id: UserId(user_id),
            email: claims.email.filter(|e| !e.is_empty()),
        })
    }

    /// Validate the value of an `Authorization` header
    pub fn validate_header(&self, header: &str) -> Result<AuthenticatedUser, AuthError> {
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.validate(token)
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator").finish_non_exhaustive()
    }
}
