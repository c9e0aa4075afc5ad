//! Typed configuration for the whole CloudArb workspace.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CloudArbError;
use crate::ids::{ProviderId, Region, RegionClass};

/// Exponential backoff with jitter, applied between failed adapter polls:
/// a base delay, a growth factor, and a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub base: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub factor: f64,
    /// Upper bound on the delay, regardless of attempt count.
    pub max: Duration,
    /// Fraction of the computed delay randomized away, in `[0, 1]`.
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

impl BackoffConfig {
    /// Delay to use before the `attempt`-th retry (0-indexed), before jitter.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base.as_secs_f64() * self.factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.max.as_secs_f64()))
    }
}

/// Per-provider adapter configuration: credentials reference and polling
/// cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    /// Provider this configuration applies to.
    pub provider: ProviderId,
    /// Whether this adapter is enabled for the current run.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Environment variable name holding this provider's credential, if any.
    pub credential_env: Option<String>,
    /// Regions to poll for this provider.
    pub regions: Vec<Region>,
    /// Per-adapter retry/backoff policy; falls back to the cycle default
    /// when absent.
    pub backoff: Option<BackoffConfig>,
}

fn default_true() -> bool {
    true
}

/// Pricing aggregator cycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleConfig {
    /// Target interval between aggregation cycles.
    pub interval: Duration,
    /// Hard deadline for one full fan-out cycle; adapters still in flight
    /// past this point are excluded from that cycle's publish.
    pub cycle_deadline: Duration,
    /// Per-adapter call timeout, strictly less than `cycle_deadline`.
    pub adapter_timeout: Duration,
    /// A price observation older than this is evicted from the published
    /// table even if no fresher observation replaces it.
    pub freshness_ttl: Duration,
    /// Default retry/backoff policy for adapters that don't override it.
    #[serde(default)]
    pub default_backoff: BackoffConfig,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            cycle_deadline: Duration::from_secs(10),
            adapter_timeout: Duration::from_secs(5),
            freshness_ttl: Duration::from_secs(300),
            default_backoff: BackoffConfig::default(),
        }
    }
}

/// Optimization engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    /// Wall-clock deadline given to the underlying solver, used when a
    /// request does not specify its own `solve_deadline_ms`.
    pub default_deadline: Duration,
    /// Whether decision variables are integer (instance counts) rather than
    /// continuous. CloudArb always solves with integer variables; this
    /// exists to make that choice explicit and overridable in tests.
    #[serde(default = "default_true")]
    pub integer_variables: bool,
    /// Weight of the secondary lexicographic tie-break terms relative to
    /// the primary objective, chosen small enough to never change which
    /// solution is optimal, only which optimal solution is reported.
    #[serde(default = "default_tie_break_epsilon")]
    pub tie_break_epsilon: f64,
    /// How long a solved allocation remains valid in the solution cache
    /// before a fresh solve is required.
    pub solution_cache_ttl: Duration,
    /// Maximum number of solves allowed to run concurrently. Each solve is
    /// internally single-threaded; this bounds how many may run in
    /// parallel across independent requests.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// How long a solve waits for the first successful pricing publish
    /// before giving up with `PricingUnavailable`, for calls that arrive
    /// while the aggregator is still cold.
    #[serde(default = "default_pricing_grace_period")]
    pub pricing_grace_period: Duration,
}

fn default_pricing_grace_period() -> Duration {
    Duration::from_secs(5)
}

fn default_tie_break_epsilon() -> f64 {
    1e-6
}

fn default_pool_size() -> usize {
    4
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            default_deadline: Duration::from_millis(500),
            integer_variables: true,
            tie_break_epsilon: default_tie_break_epsilon(),
            solution_cache_ttl: Duration::from_secs(30),
            pool_size: default_pool_size(),
            pricing_grace_period: default_pricing_grace_period(),
        }
    }
}

/// Arbitrage detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArbitrageConfig {
    /// Minimum fractional savings required to emit an opportunity.
    pub min_savings_fraction: f64,
    /// How long a given `(gpu_kind, region_class, cheap_line)` opportunity
    /// is suppressed from re-emission after being reported once.
    pub cooldown: Duration,
    /// Mapping from region to its region class, used to decide which lines
    /// are comparable. Regions absent from this map get their own
    /// unmapped, non-interchangeable class.
    pub region_classes: BTreeMap<Region, RegionClass>,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_savings_fraction: 0.15,
            cooldown: Duration::from_secs(300),
            region_classes: BTreeMap::new(),
        }
    }
}

impl ArbitrageConfig {
    /// Resolve a region to its configured class, or a conservative
    /// unmapped class if none is configured.
    #[must_use]
    pub fn class_for(&self, region: &Region) -> RegionClass {
        self.region_classes
            .get(region)
            .cloned()
            .unwrap_or_else(|| RegionClass::unmapped(region))
    }
}

/// Top-level configuration for a `CloudArb` instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloudArbConfig {
    /// Per-provider adapter configuration.
    pub adapters: Vec<AdapterConfig>,
    /// Pricing aggregation cycle settings.
    #[serde(default)]
    pub cycle: CycleConfig,
    /// Optimization engine settings.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Arbitrage detector settings.
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
}

impl CloudArbConfig {
    /// Validate cross-field invariants that `serde` cannot express:
    /// non-empty, distinct providers, and `adapter_timeout < cycle_deadline`.
    pub fn validate(&self) -> Result<(), CloudArbError> {
        if self.adapters.is_empty() {
            return Err(CloudArbError::InvalidConfig(
                "at least one adapter must be configured".into(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for adapter in &self.adapters {
            if !seen.insert(adapter.provider) {
                return Err(CloudArbError::InvalidConfig(format!(
                    "duplicate adapter configuration for provider {}",
                    adapter.provider
                )));
            }
        }
        if self.cycle.adapter_timeout >= self.cycle.cycle_deadline {
            return Err(CloudArbError::InvalidConfig(
                "adapter_timeout must be strictly less than cycle_deadline".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.arbitrage.min_savings_fraction) {
            return Err(CloudArbError::InvalidConfig(
                "min_savings_fraction must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> CloudArbConfig {
        CloudArbConfig {
            adapters: vec![AdapterConfig {
                provider: ProviderId::Aws,
                enabled: true,
                credential_env: Some("AWS_PRICING_KEY".into()),
                regions: vec![Region::new("us-east-1")],
                backoff: None,
            }],
            cycle: CycleConfig::default(),
            solver: SolverConfig::default(),
            arbitrage: ArbitrageConfig::default(),
        }
    }

    #[test]
    fn rejects_empty_adapters() {
        let mut c = minimal_config();
        c.adapters.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_provider_configs() {
        let mut c = minimal_config();
        c.adapters.push(c.adapters[0].clone());
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_adapter_timeout_not_less_than_cycle_deadline() {
        let mut c = minimal_config();
        c.cycle.adapter_timeout = c.cycle.cycle_deadline;
        assert!(c.validate().is_err());
    }

    #[test]
    fn accepts_minimal_config() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn backoff_delay_grows_and_caps() {
        let b = BackoffConfig::default();
        assert!(b.delay_for_attempt(0) < b.delay_for_attempt(1));
        assert!(b.delay_for_attempt(20) <= b.max);
    }
}
