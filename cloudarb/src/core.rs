//! The `CloudArb` orchestrator: owns the aggregator, arbitrage detector, and
//! optimization engine, and exposes the public operations over them.

use std::sync::Arc;

use cloudarb_aggregator::PricingAggregator;
use cloudarb_arbitrage::ArbitrageDetector;
use cloudarb_core::StreamHandle;
use cloudarb_optimizer::{OptimizationEngine, RunId, RunState};
use cloudarb_types::{Allocation, CloudArbConfig, CloudArbError, Opportunity, PricingTable, Request};
use tokio::sync::broadcast;

/// A running CloudArb instance: a pricing aggregator polling every
/// configured provider, an arbitrage detector watching its published table,
/// and an optimization engine ready to solve requests against it.
pub struct CloudArb {
    aggregator: Arc<PricingAggregator>,
    aggregator_handle: StreamHandle,
    detector: Arc<ArbitrageDetector>,
    detector_handle: StreamHandle,
    optimizer: Arc<OptimizationEngine>,
    cfg: CloudArbConfig,
}

impl CloudArb {
    pub(crate) fn new(
        aggregator: Arc<PricingAggregator>,
        aggregator_handle: StreamHandle,
        detector: Arc<ArbitrageDetector>,
        detector_handle: StreamHandle,
        optimizer: Arc<OptimizationEngine>,
        cfg: CloudArbConfig,
    ) -> Self {
        Self { aggregator, aggregator_handle, detector, detector_handle, optimizer, cfg }
    }

    /// Start building a `CloudArb` instance from `cfg`.
    #[must_use]
    pub fn builder(cfg: CloudArbConfig) -> crate::builder::CloudArbBuilder {
        crate::builder::CloudArbBuilder::new(cfg)
    }

    /// The configuration this instance was built from.
    #[must_use]
    pub fn config(&self) -> &CloudArbConfig {
        &self.cfg
    }

    /// The most recently published pricing snapshot.
    #[must_use]
    pub fn pricing_snapshot(&self) -> Arc<PricingTable> {
        self.aggregator.snapshot()
    }

    /// Subscribe to newly detected arbitrage opportunities.
    #[must_use]
    pub fn subscribe_opportunities(&self) -> broadcast::Receiver<Opportunity> {
        self.detector.subscribe()
    }

    /// Solve `request` against the current pricing snapshot and wait for the
    /// result.
    pub async fn quick_optimize(&self, request: &Request) -> Result<Allocation, CloudArbError> {
        self.optimizer.quick_optimize(request).await
    }

    /// Submit `request` for asynchronous solving; poll with `get_optimization`.
    pub async fn submit_optimization(&self, request: Request) -> RunId {
        self.optimizer.submit(request).await
    }

    /// Poll the state of a previously submitted optimization run.
    pub async fn get_optimization(&self, id: RunId) -> Result<RunState, CloudArbError> {
        self.optimizer.get_run(id).await
    }

    /// Gracefully stop the aggregator and detector loops, awaiting both.
    pub async fn shutdown(self) {
        self.aggregator_handle.stop().await;
        self.detector_handle.stop().await;
    }
}
