//! Static capability description for a provider adapter.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What an adapter can and cannot do, declared once at construction and
/// consulted by the aggregator and middleware stack rather than probed at
/// call time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdapterCapabilities {
    /// Whether this adapter ever reports spot/preemptible pricing.
    pub supports_spot: bool,
    /// Whether prices vary per-region for this provider (some providers
    /// quote a single global price for certain instance families).
    pub has_region_granularity: bool,
    /// Maximum sustained queries-per-second this adapter should be driven
    /// at, used by the quota middleware.
    pub sustainable_qps: f64,
    /// Minimum interval between polls of this adapter, regardless of qps
    /// budget (a floor, not a target).
    pub min_poll_interval: Duration,
}

impl AdapterCapabilities {
    /// A reasonable default for a provider with a conventional public
    /// pricing API: spot support, per-region pricing, modest qps.
    #[must_use]
    pub const fn conventional() -> Self {
        Self {
            supports_spot: true,
            has_region_granularity: true,
            sustainable_qps: 2.0,
            min_poll_interval: Duration::from_secs(5),
        }
    }

    /// Defaults for a provider with no spot market (Lambda Labs, RunPod).
    #[must_use]
    pub const fn no_spot() -> Self {
        Self {
            supports_spot: false,
            ..Self::conventional()
        }
    }
}
