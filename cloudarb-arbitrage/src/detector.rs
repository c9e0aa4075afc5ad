//! The long-lived arbitrage detection task.

use std::sync::Arc;

use cloudarb_aggregator::PricingAggregator;
use cloudarb_core::StreamHandle;
use cloudarb_types::{ArbitrageConfig, Opportunity};
use moka::sync::Cache;
use tokio::sync::{broadcast, oneshot};

use crate::detect::detect;

/// Watches a `PricingAggregator`'s published table and emits `Opportunity`
/// events whenever a cross-provider price gap clears the configured
/// threshold.
pub struct ArbitrageDetector {
    events: broadcast::Sender<Opportunity>,
}

impl ArbitrageDetector {
    /// Spawn the detector loop against `aggregator`, using `risk_tolerance`
    /// to blend on-demand/spot prices the same way the optimizer would.
    #[must_use]
    pub fn start(
        aggregator: Arc<PricingAggregator>,
        cfg: ArbitrageConfig,
        risk_tolerance: f64,
    ) -> (Self, StreamHandle) {
        let (events_tx, _) = broadcast::channel(256);
        let cooldown: Cache<String, ()> = Cache::builder().time_to_live(cfg.cooldown).build();
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let loop_tx = events_tx.clone();
        let mut generations = aggregator.subscribe();
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    changed = generations.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let table = aggregator.snapshot();
                        for opportunity in detect(&table, &cfg, risk_tolerance) {
                            let key = opportunity.cheap.fingerprint() + "->" + &opportunity.expensive.fingerprint();
                            if cooldown.get(&key).is_some() {
                                continue;
                            }
                            cooldown.insert(key, ());
                            let _ = loop_tx.send(opportunity);
                        }
                    }
                }
            }
        });

        (Self { events: events_tx }, StreamHandle::new(join, stop_tx))
    }

    /// Subscribe to newly detected opportunities. Slow subscribers drop
    /// the oldest buffered event rather than stall the detector loop.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Opportunity> {
        self.events.subscribe()
    }
}
