//! The `ProviderAdapter` trait: the single capability every cloud provider
//! integration implements.

use std::time::Duration;

use async_trait::async_trait;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId};

/// Fetches normalized price points for one cloud provider.
///
/// Unlike the many-capability connector traits this pattern is adapted
/// from, a `ProviderAdapter` has exactly one responsibility: given a
/// filter, return every price point it can currently observe that the
/// filter permits. Region selection, credential handling, and HTTP
/// transport are adapter-specific and live behind this one method.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider this adapter serves.
    fn provider(&self) -> ProviderId;

    /// Static capability description, consulted by the aggregator and the
    /// quota middleware without needing to call the adapter.
    fn capabilities(&self) -> AdapterCapabilities;

    /// Fetch current prices matching `filter`.
    ///
    /// Implementations should return `Err` for transport/parse failures
    /// rather than returning a partial, silently-truncated list; the
    /// aggregator decides how to treat a failed adapter for the cycle.
    /// Adapters that cannot restrict a request server-side may fetch
    /// broadly and apply `filter.allows` themselves before returning.
    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError>;
}

/// Map an adapter-internal error onto a `CloudArbError`, tagging it with
/// the provider name unless it is already a recognized, specific variant.
#[must_use]
pub fn tag_err(provider: ProviderId, e: CloudArbError) -> CloudArbError {
    match e {
        e @ (CloudArbError::AuthFailed { .. } | CloudArbError::InvalidConfig(_)) => e,
        other => CloudArbError::Other(format!("{provider}: {other}")),
    }
}

/// Wrap an adapter call with a timeout, mapping an elapsed deadline onto a
/// standardized error rather than a raw `Elapsed`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "cloudarb_core::adapter::call_with_timeout", skip(fut), fields(provider = %provider, timeout_ms = timeout.as_millis() as u64))
)]
pub async fn call_with_timeout<T, Fut>(
    provider: ProviderId,
    timeout: Duration,
    fut: Fut,
) -> Result<T, CloudArbError>
where
    Fut: core::future::Future<Output = Result<T, CloudArbError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(CloudArbError::Other(format!(
            "{provider}: adapter call timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
