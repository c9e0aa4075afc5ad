//! cloudarb-mock
//!
//! Deterministic mock provider adapter and fixture pricing data, for
//! CI-safe tests and examples that should not depend on network access or
//! live provider pricing.
#![warn(missing_docs)]

/// The mock adapter itself.
pub mod adapter;
/// Static fixture pricing data mirroring the reference scenarios.
pub mod fixtures;

pub use adapter::{MockAdapter, FAIL_REGION, TIMEOUT_REGION};
