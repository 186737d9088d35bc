//! Configuration types for token validation

use std::time::Duration;

/// Minimum accepted length of the shared JWT secret
pub const MIN_SECRET_LEN: usize = 32;

/// Token validation configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret of the identity provider
    pub jwt_secret: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Clock skew tolerated on `exp`
    pub leeway: Duration,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(jwt_secret: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            audience: audience.into(),
            leeway: Duration::from_secs(30),
        }
    }

    /// Set the tolerated clock skew
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[redacted]")
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish()
    }
}
