//! Quarantine middleware: an adapter that fails authentication is gated out
//! of the aggregator's fan-out until an operator intervenes.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cloudarb_core::{Middleware, MiddlewarePosition, ProviderAdapter};
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId};

/// Wraps an adapter so that, after an `AuthFailed` error, further calls are
/// short-circuited for `quarantine` rather than repeatedly hitting a
/// provider whose credentials are known to be rejected.
pub struct BlacklistMiddleware<A> {
    inner: A,
    quarantine: Duration,
    until: Mutex<Option<Instant>>,
}

impl<A: ProviderAdapter> BlacklistMiddleware<A> {
    /// Wrap `inner`, quarantining it for `quarantine` after an auth failure.
    #[must_use]
    pub const fn new(inner: A, quarantine: Duration) -> Self {
        Self {
            inner,
            quarantine,
            until: Mutex::new(None),
        }
    }

    /// # Panics
    /// Panics if the internal mutex is poisoned.
    fn remaining(&self) -> Option<Duration> {
        let mut guard = self.until.lock().expect("mutex poisoned");
        let now = Instant::now();
        match *guard {
            Some(until) if now < until => Some(until.saturating_duration_since(now)),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }

    /// # Panics
    /// Panics if the internal mutex is poisoned.
    fn quarantine_until(&self, until: Instant) {
        *self.until.lock().expect("mutex poisoned") = Some(until);
    }
}

#[async_trait]
impl<A: ProviderAdapter> ProviderAdapter for BlacklistMiddleware<A> {
    fn provider(&self) -> ProviderId {
        self.inner.provider()
    }

    fn capabilities(&self) -> AdapterCapabilities {
        self.inner.capabilities()
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        if let Some(remaining) = self.remaining() {
            return Err(CloudArbError::Other(format!(
                "{} is quarantined for another {}ms",
                self.inner.provider(),
                remaining.as_millis()
            )));
        }
        let result = self.inner.fetch_pricing(filter).await;
        if let Err(CloudArbError::AuthFailed { .. }) = &result {
            self.quarantine_until(Instant::now() + self.quarantine);
        }
        result
    }
}

impl<A: ProviderAdapter> Middleware for BlacklistMiddleware<A> {
    fn middleware_name(&self) -> &'static str {
        "BlacklistMiddleware"
    }

    fn position(&self) -> MiddlewarePosition {
        MiddlewarePosition::Blacklist
    }
}
