//! Histoires Types - Shared domain types
//!
//! This crate contains domain types used across the Histoires services:
//! - User identity
//! - Subscription tiers and usage limits
//! - Stories, favorites and the theme catalog
//! - Billing types

pub mod billing;
pub mod error;
pub mod story;
pub mod subscription;
pub mod theme;
pub mod tier;
pub mod usage;
pub mod user;

pub use billing::*;
pub use error::*;
pub use story::*;
pub use subscription::*;
pub use theme::*;
pub use tier::*;
pub use usage::*;
pub use user::*;
