//! cloudarb-aggregator
//!
//! Fans out to every configured provider adapter on a fixed cycle,
//! merges successful responses into a `PricingTable`, and publishes it for
//! lock-free concurrent reads.
#![warn(missing_docs)]

/// One aggregation cycle: fan-out, timeout handling, and merge.
pub mod cycle;
/// The long-lived aggregator task and its public handle.
pub mod aggregator;
/// Lock-free publish/subscribe table handle.
pub mod table;

pub use aggregator::PricingAggregator;
pub use cycle::{fan_out, merge, AdapterEntry, CycleOutcome};
pub use table::PricingTableHandle;
