//! REST API handlers

pub mod account;
pub mod billing;
pub mod favorites;
pub mod generate;
pub mod health;
pub mod media;
pub mod shared;
pub mod stories;
pub mod themes;
pub mod usage;

pub use account::*;
pub use billing::*;
pub use favorites::*;
pub use generate::*;
pub use health::*;
pub use media::*;
pub use stories::*;
pub use themes::*;
pub use usage::*;
