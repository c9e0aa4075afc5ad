//! Arbitrage opportunity events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{GpuKind, Line, RegionClass};

/// A detected price gap between two lines offering equivalent GPU capacity
/// within the same region class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// GPU kind the opportunity applies to.
    pub gpu_kind: GpuKind,
    /// Region class both lines belong to.
    pub region_class: RegionClass,
    /// The more expensive line.
    pub expensive: Line,
    /// The cheaper line.
    pub cheap: Line,
    /// Expensive line's effective hourly price.
    pub expensive_per_hour: Decimal,
    /// Cheap line's effective hourly price.
    pub cheap_per_hour: Decimal,
    /// Fractional savings: `(expensive - cheap) / expensive`.
    pub savings_fraction: f64,
    /// Risk of switching to `cheap`, in `[0, 1]`: a weighted average of
    /// `cheap`'s spot-share, a provider-diversity bonus (switching
    /// providers scores lower than staying on the same one), and a
    /// cross-region penalty.
    pub risk_score: f64,
    /// When this opportunity was detected.
    pub detected_at: DateTime<Utc>,
}

impl Opportunity {
    /// Absolute hourly savings of switching from `expensive` to `cheap`.
    #[must_use]
    pub fn savings_per_hour(&self) -> Decimal {
        self.expensive_per_hour - self.cheap_per_hour
    }
}
