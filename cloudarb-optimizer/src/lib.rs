//! cloudarb-optimizer
//!
//! Turns a demanded GPU workload into a cost-optimal multi-cloud placement
//! by solving a small mixed-integer program over the pricing aggregator's
//! latest snapshot.
#![warn(missing_docs)]

/// The MILP formulation: candidate lines, decision variables, objective,
/// constraints, and solution extraction.
pub mod model;
/// The long-lived engine: solution cache, solve dedup, run registry.
pub mod engine;
/// Async run registry backing submit/poll style optimization requests.
pub mod run_registry;

pub use engine::OptimizationEngine;
pub use model::solve;
pub use run_registry::{RunId, RunRegistry, RunState};
