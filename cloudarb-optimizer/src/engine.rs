//! The long-lived optimization engine: wraps the MILP solver with a
//! solution cache, at-most-one-in-flight-solve-per-fingerprint dedup, and
//! the async run registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cloudarb_aggregator::PricingAggregator;
use cloudarb_types::{Allocation, CloudArbError, Request, SolverConfig};
use moka::future::Cache;
use tokio::sync::{Notify, Semaphore};

use crate::model;
use crate::run_registry::{RunId, RunRegistry, RunState};

/// Builds a stable cache key from a request and the pricing generation it
/// would be solved against: two identical requests against the same
/// generation always resolve to the same allocation, so they share a cache
/// entry and a single in-flight solve.
fn fingerprint(request: &Request, generation: cloudarb_types::Generation) -> String {
    let body = serde_json::to_string(request).unwrap_or_default();
    format!("{generation}:{body}")
}

/// Coordinates solving [`Request`]s against the pricing aggregator's latest
/// snapshot.
pub struct OptimizationEngine {
    aggregator: Arc<PricingAggregator>,
    cfg: SolverConfig,
    cache: Cache<String, Allocation>,
    in_flight: Mutex<HashMap<String, Arc<Notify>>>,
    registry: Arc<RunRegistry>,
    /// Bounds how many solves run concurrently; acquired for the duration
    /// of each `good_lp`/HiGHS invocation, never shared across solves.
    solver_pool: Arc<Semaphore>,
}

impl OptimizationEngine {
    /// Build an engine reading pricing from `aggregator`.
    #[must_use]
    pub fn new(aggregator: Arc<PricingAggregator>, cfg: SolverConfig) -> Arc<Self> {
        let cache = Cache::builder().time_to_live(cfg.solution_cache_ttl).build();
        let solver_pool = Arc::new(Semaphore::new(cfg.pool_size.max(1)));
        Arc::new(Self {
            aggregator,
            cfg,
            cache,
            in_flight: Mutex::new(HashMap::new()),
            registry: RunRegistry::new(),
            solver_pool,
        })
    }

    /// Solve `request` against the current pricing snapshot, blocking the
    /// caller until a result is ready. Concurrent identical requests against
    /// the same pricing generation share one solve.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "cloudarb_optimizer::engine::quick_optimize", skip(self, request))
    )]
    pub async fn quick_optimize(&self, request: &Request) -> Result<Allocation, CloudArbError> {
        request.validate()?;
        let table = self.wait_for_pricing().await?;
        let key = fingerprint(request, table.generation);

        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let notify = {
            let mut in_flight = self.in_flight.lock().unwrap();
            if let Some(existing) = in_flight.get(&key) {
                Some(existing.clone())
            } else {
                in_flight.insert(key.clone(), Arc::new(Notify::new()));
                None
            }
        };

        if let Some(notify) = notify {
            notify.notified().await;
            return self
                .cache
                .get(&key)
                .await
                .ok_or_else(|| CloudArbError::Other("solve coordinator lost its result".into()));
        }

        let permit = Arc::clone(&self.solver_pool)
            .acquire_owned()
            .await
            .map_err(|e| CloudArbError::Other(format!("solver pool closed: {e}")))?;
        let req = request.clone();
        let cfg = self.cfg.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            model::solve(&table, &req, &cfg)
        })
        .await
        .map_err(|e| CloudArbError::Other(format!("solver task panicked: {e}")))?;

        if let Ok(alloc) = &result {
            self.cache.insert(key.clone(), alloc.clone()).await;
        }

        let waiter = self.in_flight.lock().unwrap().remove(&key);
        if let Some(waiter) = waiter {
            waiter.notify_waiters();
        }

        result
    }

    /// Submit `request` for asynchronous solving and return a handle that
    /// can be polled with `get_run`.
    pub async fn submit(self: &Arc<Self>, request: Request) -> RunId {
        let id = self.registry.submit().await;
        let engine = Arc::clone(self);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            registry.mark_running(id).await;
            let result = engine.quick_optimize(&request).await;
            registry.complete(id, result).await;
        });
        id
    }

    /// Poll the state of a previously submitted run.
    pub async fn get_run(&self, id: RunId) -> Result<RunState, CloudArbError> {
        self.registry.get(id).await
    }

    /// Wait, up to `cfg.pricing_grace_period`, for the aggregator's first
    /// successful publish. A table at generation zero has never been
    /// published (the aggregator hasn't completed a cycle yet) and solving
    /// against it would silently report every workload `Infeasible`; this
    /// distinguishes that cold-start case and surfaces it as
    /// `PricingUnavailable` instead.
    async fn wait_for_pricing(&self) -> Result<Arc<cloudarb_types::PricingTable>, CloudArbError> {
        let mut generations = self.aggregator.subscribe();
        let table = self.aggregator.snapshot();
        if table.generation > 0 {
            return Ok(table);
        }
        match tokio::time::timeout(self.cfg.pricing_grace_period, generations.changed()).await {
            Ok(Ok(())) => Ok(self.aggregator.snapshot()),
            _ => Err(CloudArbError::pricing_unavailable(
                "no pricing has been published yet",
            )),
        }
    }
}
