//! Caching middleware: absorbs bursts of calls to the same adapter within a
//! short TTL so a slow-moving cycle interval never issues duplicate HTTP
//! requests.

use std::time::Duration;

use async_trait::async_trait;
use cloudarb_core::{Middleware, MiddlewarePosition, ProviderAdapter};
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId};
use moka::future::Cache;

/// Key for a cached fetch: the filter's GPU kinds and regions, each joined
/// and sorted so that equivalent filters with differently-ordered fields
/// share an entry.
fn cache_key(filter: &PricingFilter) -> String {
    let mut kinds: Vec<&str> = filter.gpu_kinds.iter().map(|k| k.as_str()).collect();
    kinds.sort_unstable();
    let mut regions: Vec<&str> = filter.regions.iter().map(|r| r.as_str()).collect();
    regions.sort_unstable();
    format!("{}|{}", kinds.join(","), regions.join(","))
}

/// Wraps an adapter with a short-TTL cache of its `fetch_pricing` results.
///
/// Caches only successes; a failed call is never cached, so a transient
/// outage doesn't get "stuck" serving stale data past its error.
pub struct CacheMiddleware<A> {
    inner: A,
    cache: Cache<String, Vec<PricePoint>>,
}

impl<A: ProviderAdapter> CacheMiddleware<A> {
    /// Wrap `inner`, caching successful results for `ttl`.
    pub fn new(inner: A, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }
}

#[async_trait]
impl<A: ProviderAdapter> ProviderAdapter for CacheMiddleware<A> {
    fn provider(&self) -> ProviderId {
        self.inner.provider()
    }

    fn capabilities(&self) -> AdapterCapabilities {
        self.inner.capabilities()
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        let key = cache_key(filter);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }
        let fresh = self.inner.fetch_pricing(filter).await?;
        self.cache.insert(key, fresh.clone()).await;
        Ok(fresh)
    }
}

impl<A: ProviderAdapter> Middleware for CacheMiddleware<A> {
    fn middleware_name(&self) -> &'static str {
        "CacheMiddleware"
    }

    fn position(&self) -> MiddlewarePosition {
        MiddlewarePosition::Cache
    }
}
