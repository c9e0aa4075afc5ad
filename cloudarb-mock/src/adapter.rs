//! A deterministic `ProviderAdapter` backed by a static fixture list,
//! standing in for a real provider in CI-safe tests and examples.

use async_trait::async_trait;
use chrono::Utc;
use cloudarb_core::ProviderAdapter;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId, Region};

/// A region name that, when present in a `fetch_pricing` call, makes the
/// mock adapter return an error instead of its fixtures.
pub const FAIL_REGION: &str = "FAIL";
/// A region name that, when present, makes the mock adapter sleep briefly
/// before returning its fixtures, to exercise timeout/deadline handling.
pub const TIMEOUT_REGION: &str = "TIMEOUT";

/// Mock adapter for one provider, serving a fixed list of `PricePoint`s.
pub struct MockAdapter {
    provider: ProviderId,
    capabilities: AdapterCapabilities,
    points: Vec<PricePoint>,
}

impl MockAdapter {
    /// Build a mock adapter that always reports `points` for its provider.
    #[must_use]
    pub fn new(provider: ProviderId, capabilities: AdapterCapabilities, points: Vec<PricePoint>) -> Self {
        Self { provider, capabilities, points }
    }

    async fn maybe_fail_or_timeout(&self, regions: &[Region]) -> Result<(), CloudArbError> {
        if regions.iter().any(|r| r.as_str() == FAIL_REGION) {
            return Err(CloudArbError::Other(format!("{}: forced mock failure", self.provider)));
        }
        if regions.iter().any(|r| r.as_str() == TIMEOUT_REGION) {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn capabilities(&self) -> AdapterCapabilities {
        self.capabilities
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        self.maybe_fail_or_timeout(&filter.regions).await?;
        Ok(self
            .points
            .iter()
            .filter(|p| filter.allows(p))
            .map(|p| PricePoint { observed_at: Utc::now(), ..p.clone() })
            .collect())
    }
}
