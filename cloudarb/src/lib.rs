//! CloudArb finds the cheapest way to run a GPU workload across AWS, GCP,
//! Azure, Lambda Labs, and `RunPod`, and flags cross-cloud pricing gaps as
//! they appear.
//!
//! Overview
//! - Polls every configured provider's pricing API on a fixed cycle and
//!   publishes a normalized snapshot (`cloudarb-aggregator`).
//! - Watches that snapshot for same-GPU, same-region-class price gaps and
//!   emits them as `Opportunity` events (`cloudarb-arbitrage`).
//! - Solves a demanded workload against the snapshot as a small
//!   mixed-integer program, picking the lowest-cost (or performance- or
//!   budget-weighted) placement (`cloudarb-optimizer`).
//!
//! Key behaviors and trade-offs
//! - Exact demand, not best-effort: the optimizer either places the full
//!   requested GPU count or reports the workload infeasible; it never
//!   silently under-provisions.
//! - Risk tolerance blends on-demand and spot pricing continuously in
//!   `[0, 1]` rather than offering a binary choice between them.
//! - The standard adapter middleware stack (cache, blacklist, quota) trades
//!   a small amount of staleness for protection against hammering a
//!   misbehaving or rate-limited provider.
#![warn(missing_docs)]

mod builder;
mod core;

pub use builder::CloudArbBuilder;
pub use core::CloudArb;

pub use cloudarb_optimizer::{RunId, RunState};
pub use cloudarb_types::{
    Allocation, AllocationLine, AllocationStatus, CloudArbConfig, CloudArbError, GpuKind,
    Objective, Opportunity, PricePoint, PricingTable, ProviderId, Region, Request, WorkloadItem,
};
