//! Histoires Auth - Bearer token validation
//!
//! Accounts are managed by the hosted identity provider; this crate only
//! verifies the HS256 access tokens it issues and extracts the caller.

pub mod config;
pub mod error;
pub mod token;

pub use config::*;
pub use error::*;
pub use token::*;
