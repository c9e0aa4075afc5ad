//! The long-lived pricing aggregator task.

use std::sync::Arc;

use cloudarb_core::StreamHandle;
use cloudarb_types::{CycleConfig, PricingTable};
use tokio::sync::{oneshot, watch};

use crate::cycle::{fan_out, merge, AdapterEntry};
use crate::table::PricingTableHandle;

/// Drives the periodic pricing cycle and publishes snapshots for
/// subscribers.
pub struct PricingAggregator {
    table: Arc<PricingTableHandle>,
}

impl PricingAggregator {
    /// Spawn the aggregator's cycle loop, polling `adapters` every
    /// `cfg.interval` until the returned handle is stopped or dropped.
    #[must_use]
    pub fn start(adapters: Vec<AdapterEntry>, cfg: CycleConfig) -> (Self, StreamHandle) {
        let table = Arc::new(PricingTableHandle::new());
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let loop_table = Arc::clone(&table);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cfg.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        run_one_cycle(&loop_table, &adapters, &cfg).await;
                    }
                }
            }
        });
        (Self { table }, StreamHandle::new(join, stop_tx))
    }

    /// Current published table. Cheap: bumps an `Arc` refcount, never
    /// blocks on the cycle loop.
    #[must_use]
    pub fn snapshot(&self) -> Arc<PricingTable> {
        self.table.load()
    }

    /// A receiver that resolves on every new publish generation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.table.subscribe()
    }
}

async fn run_one_cycle(table: &PricingTableHandle, adapters: &[AdapterEntry], cfg: &CycleConfig) {
    let outcome = fan_out(adapters, cfg).await;
    #[cfg(feature = "tracing")]
    for (provider, reason) in &outcome.failed {
        tracing::warn!(%provider, %reason, "adapter excluded from pricing cycle");
    }
    #[cfg(not(feature = "tracing"))]
    let _ = &outcome.failed;

    let prior = table.load();
    let merged = merge(&prior, outcome.fresh, cfg.freshness_ttl);
    table.publish(merged);
}
