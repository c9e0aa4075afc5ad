//! Middleware wrapping a `ProviderAdapter` with cross-cutting policy.

use async_trait::async_trait;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId};

use crate::adapter::ProviderAdapter;

/// Where a middleware sits in the wrapping stack, used by
/// [`enforce_ordering`](crate::middleware::enforce_ordering) to validate a
/// stack was built in the required order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MiddlewarePosition {
    /// Closest to the caller: serves cached results without touching inner
    /// layers.
    Cache,
    /// Refuses calls to a provider currently in quarantine.
    Blacklist,
    /// Throttles call rate against a configured budget.
    Quota,
}

/// A `ProviderAdapter` decorator. Every middleware is itself a
/// `ProviderAdapter`, so stacks compose by wrapping: `Cache::new(Blacklist::new(Quota::new(raw)))`.
///
/// Deliberately smaller than a fully dynamic middleware trait would be:
/// drops any `config_json`/`validate`/`as_any` surface, since CloudArb's
/// three middlewares (cache, blacklist, quota) are fixed and constructed
/// directly, with no dynamic stack introspection or serialization
/// round-trip required.
pub trait Middleware: ProviderAdapter {
    /// Stable name used in logs and error messages.
    fn middleware_name(&self) -> &'static str;

    /// This middleware's required position in a stack, for ordering checks.
    fn position(&self) -> MiddlewarePosition;
}

/// Validate that a constructed stack's declared positions are in
/// non-decreasing order from the outermost middleware inward
/// (`Cache < Blacklist < Quota`).
pub fn enforce_ordering(positions: &[MiddlewarePosition]) -> Result<(), CloudArbError> {
    for pair in positions.windows(2) {
        if pair[0] > pair[1] {
            return Err(CloudArbError::InvalidConfig(format!(
                "middleware stack out of order: {:?} must come before {:?}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

/// A `ProviderAdapter` that forwards every call unchanged, useful as the
/// innermost layer in tests that only want to exercise the middleware
/// stack itself.
pub struct PassThrough<A> {
    inner: A,
}

impl<A> PassThrough<A> {
    /// Wrap `inner` with no behavior change.
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: ProviderAdapter> ProviderAdapter for PassThrough<A> {
    fn provider(&self) -> ProviderId {
        self.inner.provider()
    }

    fn capabilities(&self) -> AdapterCapabilities {
        self.inner.capabilities()
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        self.inner.fetch_pricing(filter).await
    }
}
