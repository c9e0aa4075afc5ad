//! cloudarb-core
//!
//! Core traits shared across the CloudArb ecosystem.
//!
//! - `adapter`: the `ProviderAdapter` trait and the provider-call timeout wrapper.
//! - `middleware`: the `Middleware` trait and stack-ordering validation.
//! - `stream`: the `StreamHandle` task-lifecycle abstraction.
#![warn(missing_docs)]

/// The `ProviderAdapter` trait and timeout/error-tagging helpers.
pub mod adapter;
/// The `Middleware` trait and stack-ordering validation.
pub mod middleware;
/// `StreamHandle` and friends for long-lived task lifecycles.
pub mod stream;

pub use adapter::{call_with_timeout, tag_err, ProviderAdapter};
pub use middleware::{enforce_ordering, Middleware, MiddlewarePosition, PassThrough};
pub use stream::StreamHandle;
