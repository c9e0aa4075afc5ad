//! Core data model, configuration, and error types for CloudArb.
//!
//! This crate has no async runtime dependency and no I/O: it exists so that
//! `cloudarb-core`, `cloudarb-adapters`, `cloudarb-aggregator`,
//! `cloudarb-arbitrage`, and `cloudarb-optimizer` all speak the same
//! vocabulary of providers, prices, requests, and allocations.

pub mod allocation;
pub mod capability;
pub mod config;
pub mod error;
pub mod ids;
pub mod opportunity;
pub mod pricing;
pub mod request;

pub use allocation::{Allocation, AllocationLine, AllocationStatus};
pub use capability::AdapterCapabilities;
pub use config::{AdapterConfig, ArbitrageConfig, BackoffConfig, CloudArbConfig, CycleConfig, SolverConfig};
pub use error::CloudArbError;
pub use ids::{GpuKind, Line, ProviderId, Region, RegionClass};
pub use opportunity::Opportunity;
pub use pricing::{Generation, InstanceType, PricePoint, PricingFilter, PricingTable};
pub use request::{Objective, Request, WorkloadItem};
