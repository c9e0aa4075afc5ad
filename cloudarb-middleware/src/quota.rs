//! Rate-limiting middleware bounding calls to an adapter's sustainable qps.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cloudarb_core::{Middleware, MiddlewarePosition, ProviderAdapter};
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId};

struct QuotaRuntime {
    last_call: Option<Instant>,
    min_interval: Duration,
}

/// Wraps an adapter so that calls are rejected, rather than queued, once
/// they arrive faster than the adapter's declared `sustainable_qps` allows.
///
/// The aggregator's cycle loop already paces polls to the configured
/// interval; this middleware exists as the last line of defense against a
/// misconfigured cycle interval hammering a provider's pricing API.
pub struct QuotaMiddleware<A> {
    inner: A,
    runtime: Mutex<QuotaRuntime>,
}

impl<A: ProviderAdapter> QuotaMiddleware<A> {
    /// Wrap `inner`, deriving the minimum call spacing from its declared
    /// capabilities (`1 / sustainable_qps`, floored by `min_poll_interval`).
    pub fn new(inner: A) -> Self {
        let caps = inner.capabilities();
        let from_qps = if caps.sustainable_qps > 0.0 {
            Duration::from_secs_f64(1.0 / caps.sustainable_qps)
        } else {
            Duration::ZERO
        };
        let min_interval = from_qps.max(caps.min_poll_interval);
        Self {
            inner,
            runtime: Mutex::new(QuotaRuntime {
                last_call: None,
                min_interval,
            }),
        }
    }

    /// Check and record a call attempt against the spacing budget.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    fn should_allow_call(&self) -> Result<(), CloudArbError> {
        let mut rt = self.runtime.lock().expect("mutex poisoned");
        let now = Instant::now();
        if let Some(last) = rt.last_call {
            let elapsed = now.duration_since(last);
            if elapsed < rt.min_interval {
                let wait_ms = (rt.min_interval - elapsed).as_millis();
                return Err(CloudArbError::Other(format!(
                    "quota exceeded for {}: retry in {wait_ms}ms",
                    self.inner.provider()
                )));
            }
        }
        rt.last_call = Some(now);
        Ok(())
    }
}

#[async_trait]
impl<A: ProviderAdapter> ProviderAdapter for QuotaMiddleware<A> {
    fn provider(&self) -> ProviderId {
        self.inner.provider()
    }

    fn capabilities(&self) -> AdapterCapabilities {
        self.inner.capabilities()
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        self.should_allow_call()?;
        self.inner.fetch_pricing(filter).await
    }
}

impl<A: ProviderAdapter> Middleware for QuotaMiddleware<A> {
    fn middleware_name(&self) -> &'static str {
        "QuotaMiddleware"
    }

    fn position(&self) -> MiddlewarePosition {
        MiddlewarePosition::Quota
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAdapter {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProviderAdapter for CountingAdapter {
        fn provider(&self) -> ProviderId {
            ProviderId::Aws
        }

        fn capabilities(&self) -> AdapterCapabilities {
            AdapterCapabilities {
                sustainable_qps: 1.0,
                min_poll_interval: Duration::from_millis(50),
                ..AdapterCapabilities::conventional()
            }
        }

        async fn fetch_pricing(&self, _filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn second_immediate_call_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = QuotaMiddleware::new(CountingAdapter { calls: calls.clone() });
        assert!(adapter.fetch_pricing(&PricingFilter::default()).await.is_ok());
        assert!(adapter.fetch_pricing(&PricingFilter::default()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
