//! Common test utilities for the Story API

#![allow(dead_code)]

pub mod app;
pub mod providers;

#[allow(unused_imports)]
pub use app::*;
#[allow(unused_imports)]
pub use providers::*;
