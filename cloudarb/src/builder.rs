//! Builds a `CloudArb` instance from a `CloudArbConfig`, instantiating the
//! concrete adapter for each configured provider and wrapping it in the
//! standard middleware stack.

use std::sync::Arc;
use std::time::Duration;

use cloudarb_adapters::{AwsAdapter, AzureAdapter, CredentialHandle, GcpAdapter, LambdaLabsAdapter, RunPodAdapter};
use cloudarb_aggregator::{AdapterEntry, PricingAggregator};
use cloudarb_arbitrage::ArbitrageDetector;
use cloudarb_core::ProviderAdapter;
use cloudarb_middleware::standard_stack;
use cloudarb_optimizer::OptimizationEngine;
use cloudarb_types::{AdapterConfig, CloudArbConfig, CloudArbError, ProviderId};

use crate::core::CloudArb;

/// Constructs a `CloudArb` instance, one provider adapter at a time, from a
/// validated configuration.
pub struct CloudArbBuilder {
    cfg: CloudArbConfig,
    http: reqwest::Client,
}

impl CloudArbBuilder {
    /// Start building from `cfg`. The `reqwest::Client` used by every HTTP
    /// adapter is shared, so connection pooling works across providers.
    #[must_use]
    pub fn new(cfg: CloudArbConfig) -> Self {
        Self { cfg, http: reqwest::Client::new() }
    }

    /// Override the shared HTTP client, e.g. to point adapters at a test
    /// server or to set custom timeouts.
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    fn build_raw_adapter(&self, adapter_cfg: &AdapterConfig) -> Arc<dyn ProviderAdapter> {
        let credential = CredentialHandle::from_env(adapter_cfg.credential_env.as_deref());
        match adapter_cfg.provider {
            ProviderId::Aws => Arc::new(AwsAdapter::new(self.http.clone())),
            ProviderId::Gcp => Arc::new(GcpAdapter::new(self.http.clone(), credential)),
            ProviderId::Azure => Arc::new(AzureAdapter::new(self.http.clone())),
            ProviderId::LambdaLabs => Arc::new(LambdaLabsAdapter::new(self.http.clone(), credential)),
            ProviderId::RunPod => Arc::new(RunPodAdapter::new(self.http.clone(), credential)),
        }
    }

    /// Validate the configuration, instantiate and wrap every enabled
    /// adapter, and spawn the aggregator and arbitrage detector loops.
    pub fn build(self) -> Result<CloudArb, CloudArbError> {
        self.cfg.validate()?;

        let mut entries = Vec::new();
        for adapter_cfg in &self.cfg.adapters {
            if !adapter_cfg.enabled {
                continue;
            }
            let raw = self.build_raw_adapter(adapter_cfg);
            let cache_ttl = self.cfg.cycle.freshness_ttl;
            let quarantine = adapter_cfg
                .backoff
                .as_ref()
                .unwrap_or(&self.cfg.cycle.default_backoff)
                .max;
            entries.push(AdapterEntry {
                adapter: Arc::new(WrappedAdapter::new(raw, cache_ttl, quarantine)),
                regions: adapter_cfg.regions.clone(),
            });
        }

        let (aggregator, aggregator_handle) = PricingAggregator::start(entries, self.cfg.cycle.clone());
        let aggregator = Arc::new(aggregator);

        let (detector, detector_handle) = ArbitrageDetector::start(Arc::clone(&aggregator), self.cfg.arbitrage.clone(), 0.0);

        let optimizer = OptimizationEngine::new(Arc::clone(&aggregator), self.cfg.solver.clone());

        Ok(CloudArb::new(aggregator, aggregator_handle, Arc::new(detector), detector_handle, optimizer, self.cfg))
    }
}

/// Type-erases the generic middleware stack returned by `standard_stack` so
/// every adapter entry can share one `Vec<AdapterEntry>` regardless of
/// provider.
struct WrappedAdapter {
    inner: Box<dyn ProviderAdapter>,
}

impl WrappedAdapter {
    fn new(raw: Arc<dyn ProviderAdapter>, cache_ttl: Duration, quarantine: Duration) -> Self {
        Self { inner: Box::new(standard_stack(ArcAdapter(raw), cache_ttl, quarantine)) }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for WrappedAdapter {
    fn provider(&self) -> ProviderId {
        self.inner.provider()
    }

    fn capabilities(&self) -> cloudarb_types::AdapterCapabilities {
        self.inner.capabilities()
    }

    async fn fetch_pricing(&self, filter: &cloudarb_types::PricingFilter) -> Result<Vec<cloudarb_types::PricePoint>, CloudArbError> {
        self.inner.fetch_pricing(filter).await
    }
}

/// Adapts an `Arc<dyn ProviderAdapter>` back into a concrete `ProviderAdapter`
/// impl so it can be passed by value into `standard_stack`'s generic `A`.
struct ArcAdapter(Arc<dyn ProviderAdapter>);

#[async_trait::async_trait]
impl ProviderAdapter for ArcAdapter {
    fn provider(&self) -> ProviderId {
        self.0.provider()
    }

    fn capabilities(&self) -> cloudarb_types::AdapterCapabilities {
        self.0.capabilities()
    }

    async fn fetch_pricing(&self, filter: &cloudarb_types::PricingFilter) -> Result<Vec<cloudarb_types::PricePoint>, CloudArbError> {
        self.0.fetch_pricing(filter).await
    }
}
