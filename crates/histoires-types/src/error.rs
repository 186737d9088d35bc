//! Common error types

use thiserror::Error;

/// Errors raised while parsing domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Unknown tier label
    #[error("invalid tier: {0}")]
    InvalidTier(String),

    /// Limit that is neither a number nor `unlimited`
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// Unknown usage action
    #[error("invalid usage action: {0}")]
    InvalidAction(String),
}
