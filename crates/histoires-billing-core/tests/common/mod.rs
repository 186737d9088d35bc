//! Common test utilities for histoires-billing-core integration tests

pub mod stripe_mock;

#[allow(unused_imports)]
pub use stripe_mock::StripeMockServer;
