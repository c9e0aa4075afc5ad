//! Optimization request types.

use serde::{Deserialize, Serialize};

use crate::ids::{GpuKind, ProviderId, Region};

/// One line item in an optimization request: a demand for between
/// `min_count` and `max_count` GPUs of `gpu_kind`, sustained for
/// `duration_hrs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadItem {
    /// Canonicalized GPU kind demanded.
    pub gpu_kind: GpuKind,
    /// Minimum number of GPUs of this kind that must be placed.
    pub min_count: u32,
    /// Maximum number of GPUs of this kind the solver may place; any count
    /// in `[min_count, max_count]` satisfies this item.
    pub max_count: u32,
    /// Expected duration of the workload, in hours. Informational for
    /// `min-cost`/`max-performance` solves today; reserved for
    /// duration-aware objectives.
    #[serde(default = "default_duration_hrs")]
    pub duration_hrs: f64,
    /// Optional human label, echoed back in the allocation for readability.
    pub label: Option<String>,
}

fn default_duration_hrs() -> f64 {
    1.0
}

/// What the optimizer should optimize for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Minimize total effective hourly cost.
    MinCost,
    /// Maximize aggregate GPU throughput for a fixed budget.
    MaxPerformance,
    /// Blend cost and performance with an explicit weight.
    Balanced {
        /// Weight on the cost term in `[0, 1]`; `1.0` behaves like
        /// `MinCost`, `0.0` like `MaxPerformance`.
        cost_weight: f64,
    },
}

impl Default for Objective {
    fn default() -> Self {
        Self::Balanced { cost_weight: 0.5 }
    }
}

/// A request to find an optimal multi-cloud GPU allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Demanded workload, one entry per distinct GPU kind.
    pub workload: Vec<WorkloadItem>,
    /// Objective to optimize for.
    #[serde(default)]
    pub objective: Objective,
    /// Risk tolerance in `[0, 1]` blending on-demand (`0.0`) toward spot
    /// (`1.0`) pricing when scoring candidate lines.
    #[serde(default)]
    pub risk_tolerance: f64,
    /// Optional hard ceiling on total hourly cost in US dollars.
    pub budget_per_hour: Option<rust_decimal::Decimal>,
    /// Optional wall-clock deadline for the solve, in milliseconds.
    pub solve_deadline_ms: Option<u64>,
    /// If non-empty, only lines from one of these providers are eligible.
    #[serde(default)]
    pub provider_allowlist: Vec<ProviderId>,
    /// If non-empty, only lines in one of these regions are eligible.
    #[serde(default)]
    pub region_allowlist: Vec<Region>,
}

impl Request {
    /// Validate structural invariants that do not require pricing data:
    /// non-empty workload, positive and consistent count ranges, risk
    /// tolerance in range.
    pub fn validate(&self) -> Result<(), crate::error::CloudArbError> {
        if self.workload.is_empty() {
            return Err(crate::error::CloudArbError::invalid_request(
                "workload must contain at least one item",
            ));
        }
        for item in &self.workload {
            if item.min_count == 0 {
                return Err(crate::error::CloudArbError::invalid_request(format!(
                    "workload item for {} has zero min_count",
                    item.gpu_kind
                )));
            }
            if item.min_count > item.max_count {
                return Err(crate::error::CloudArbError::invalid_request(format!(
                    "workload item for {} has min_count {} greater than max_count {}",
                    item.gpu_kind, item.min_count, item.max_count
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.risk_tolerance) {
            return Err(crate::error::CloudArbError::invalid_request(format!(
                "risk_tolerance {} out of range [0, 1]",
                self.risk_tolerance
            )));
        }
        if let Objective::Balanced { cost_weight } = self.objective {
            if !(0.0..=1.0).contains(&cost_weight) {
                return Err(crate::error::CloudArbError::invalid_request(format!(
                    "cost_weight {cost_weight} out of range [0, 1]"
                )));
            }
        }
        Ok(())
    }
}
