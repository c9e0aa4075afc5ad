//! Optimization results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::Line;
use crate::pricing::Generation;

/// One selected line in a solution: how many instances of `line` to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// The priced line this allocation draws from.
    pub line: Line,
    /// Number of instances of this line selected.
    pub instance_count: u32,
    /// GPUs contributed by this line (`instance_count * gpus_per_instance`).
    pub gpu_count: u32,
    /// Effective hourly price used for this line at solve time.
    pub effective_per_hour: Decimal,
}

/// Outcome of one solve attempt, mirroring the solver's own proof strength:
/// a proven optimum is a stronger result than a feasible solution found
/// under time pressure, and "no solution" itself splits into "proven
/// impossible" and "ran out of time before finding one."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStatus {
    /// The solver proved `lines` is a cost-optimal allocation.
    Optimal,
    /// A feasible allocation was found before the solve deadline, but the
    /// solver could not prove it optimal. `Allocation::optimality_gap`
    /// carries the reported gap when available.
    FeasibleGap,
    /// No feasible allocation exists under the given constraints.
    Infeasible,
    /// The solve deadline elapsed before any feasible allocation was found.
    Timeout,
}

/// The result of solving one optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Outcome of the solve.
    pub status: AllocationStatus,
    /// Selected lines, empty unless `status` is `Optimal` or `FeasibleGap`.
    pub lines: Vec<AllocationLine>,
    /// Total effective hourly cost of `lines`.
    pub total_per_hour: Decimal,
    /// Generation of the pricing table this solution was computed against.
    pub pricing_generation: Generation,
    /// When the solve completed.
    pub solved_at: DateTime<Utc>,
    /// Reported optimality gap as a fraction of the incumbent cost, set
    /// when `status` is `FeasibleGap` (and `Some(0.0)` for `Optimal`).
    pub optimality_gap: Option<f64>,
    /// Human-readable explanation, populated for `Infeasible`/`Timeout`
    /// outcomes (e.g. which constraint could not be met).
    pub explanation: Option<String>,
}

impl Allocation {
    /// Total GPUs actually placed across all lines.
    #[must_use]
    pub fn total_gpus(&self) -> u32 {
        self.lines.iter().map(|l| l.gpu_count).sum()
    }
}
