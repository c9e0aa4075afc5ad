//! cloudarb-arbitrage
//!
//! Detects cross-cloud GPU pricing gaps from a published `PricingTable`
//! and emits them as a stream of `Opportunity` events.
#![warn(missing_docs)]

/// Pure gap-detection logic over a single `PricingTable` snapshot.
pub mod detect;
/// The long-lived detector task and its public handle.
pub mod detector;

pub use detect::detect;
pub use detector::ArbitrageDetector;
