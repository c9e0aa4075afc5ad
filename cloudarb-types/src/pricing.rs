//! Price observations and the published pricing snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{GpuKind, Line, ProviderId, Region};

/// Monotonically increasing publish counter. Every successful aggregator
/// cycle that publishes a new table bumps this by one; subscribers compare
/// generations rather than timestamps to detect a fresh snapshot.
pub type Generation = u64;

/// A single instance type as reported by one provider, before prices are
/// attached. Distinct from [`Line`]: `InstanceType` carries descriptive
/// shape (GPU kind/count, vCPU, memory); `Line` is the minimal key used for
/// cache lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceType {
    /// Provider-specific instance type name, e.g. `p4d.24xlarge`.
    pub name: String,
    /// Canonicalized GPU kind attached to this instance.
    pub gpu_kind: GpuKind,
    /// Number of GPUs of `gpu_kind` per instance.
    pub gpu_count: u32,
    /// Virtual CPUs, when reported by the provider.
    pub vcpus: Option<u32>,
    /// Memory in GiB, when reported by the provider.
    pub memory_gib: Option<u32>,
}

/// A normalized price observation for one `(provider, instance, region)`
/// line, expressed as an hourly $/hr rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// The line this price applies to.
    pub line: Line,
    /// Instance shape metadata.
    pub instance: InstanceType,
    /// On-demand hourly rate in US dollars.
    pub on_demand_per_hour: Decimal,
    /// Spot/preemptible hourly rate, when the provider offers one.
    ///
    /// `None` for providers that never offer spot (`supports_spot() ==
    /// false`) and also for a provider that temporarily omitted a spot
    /// quote for this line; the two cases are distinguished by
    /// `line.provider.supports_spot()`, not by this field alone.
    pub spot_per_hour: Option<Decimal>,
    /// When this observation was fetched from the provider.
    pub observed_at: DateTime<Utc>,
}

impl PricePoint {
    /// Risk-tolerance-blended effective hourly price:
    /// `(1 - alpha) * on_demand + alpha * spot`.
    ///
    /// `alpha` is clamped to `[0, 1]`. Falls back to the on-demand price
    /// when no spot quote is available, regardless of `alpha`.
    #[must_use]
    pub fn effective_per_hour(&self, alpha: f64) -> Decimal {
        let Some(spot) = self.spot_per_hour else {
            return self.on_demand_per_hour;
        };
        let alpha = alpha.clamp(0.0, 1.0);
        let alpha = Decimal::try_from(alpha).unwrap_or(Decimal::ZERO);
        let one = Decimal::ONE;
        (one - alpha) * self.on_demand_per_hour + alpha * spot
    }
}

/// Restricts a `FetchPricing` call to the GPU kinds/regions actually
/// needed. An empty `Vec` in either field means "no restriction on this
/// axis," so `PricingFilter::default()` fetches everything an adapter can
/// see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingFilter {
    /// Canonicalized GPU kinds to restrict to; empty means every kind.
    pub gpu_kinds: Vec<GpuKind>,
    /// Regions to restrict to; empty means every region.
    pub regions: Vec<Region>,
}

impl PricingFilter {
    /// Build a filter restricted to `regions` with no GPU-kind restriction.
    #[must_use]
    pub fn for_regions(regions: Vec<Region>) -> Self {
        Self { gpu_kinds: Vec::new(), regions }
    }

    /// Whether `point` is permitted by this filter.
    #[must_use]
    pub fn allows(&self, point: &PricePoint) -> bool {
        (self.gpu_kinds.is_empty() || self.gpu_kinds.contains(&point.instance.gpu_kind))
            && (self.regions.is_empty() || self.regions.contains(&point.line.region))
    }
}

/// An immutable snapshot of all currently known prices, published
/// atomically by the pricing aggregator once per cycle.
///
/// Cheap to clone: callers hold an `Arc<PricingTable>` via
/// `arc_swap::ArcSwap`, so cloning the handle is just a refcount bump, not a
/// deep copy of the map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingTable {
    /// Monotonic publish counter.
    pub generation: Generation,
    /// All currently-fresh prices, keyed by line.
    pub prices: BTreeMap<Line, PricePoint>,
    /// Wall-clock time this table was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl PricingTable {
    /// An empty table at generation zero, published at no particular time.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// All price points for a given GPU kind, across every provider/region.
    pub fn by_gpu_kind<'a>(&'a self, kind: &'a GpuKind) -> impl Iterator<Item = &'a PricePoint> {
        self.prices.values().filter(move |p| &p.instance.gpu_kind == kind)
    }

    /// All price points from a given provider.
    pub fn by_provider(&self, provider: ProviderId) -> impl Iterator<Item = &PricePoint> {
        self.prices.values().filter(move |p| p.line.provider == provider)
    }

    /// All regions that currently carry at least one priced line.
    #[must_use]
    pub fn known_regions(&self) -> Vec<&Region> {
        let mut regions: Vec<&Region> = self.prices.keys().map(|l| &l.region).collect();
        regions.sort();
        regions.dedup();
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn point(on_demand: &str, spot: Option<&str>) -> PricePoint {
        PricePoint {
            line: Line::new(ProviderId::Aws, "p4d.24xlarge", Region::new("us-east-1")),
            instance: InstanceType {
                name: "p4d.24xlarge".into(),
                gpu_kind: GpuKind::new("A100"),
                gpu_count: 8,
                vcpus: Some(96),
                memory_gib: Some(1152),
            },
            on_demand_per_hour: Decimal::from_str(on_demand).unwrap(),
            spot_per_hour: spot.map(|s| Decimal::from_str(s).unwrap()),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn effective_price_falls_back_to_on_demand_without_spot() {
        let p = point("16.00", None);
        assert_eq!(p.effective_per_hour(0.8), Decimal::from_str("16.00").unwrap());
    }

    #[test]
    fn effective_price_blends_on_demand_and_spot() {
        let p = point("10.00", Some("2.00"));
        assert_eq!(p.effective_per_hour(0.0), Decimal::from_str("10.00").unwrap());
        assert_eq!(p.effective_per_hour(1.0), Decimal::from_str("2.00").unwrap());
        assert_eq!(p.effective_per_hour(0.5), Decimal::from_str("6.00").unwrap());
    }

    #[test]
    fn alpha_is_clamped_outside_unit_interval() {
        let p = point("10.00", Some("2.00"));
        assert_eq!(p.effective_per_hour(-1.0), p.effective_per_hour(0.0));
        assert_eq!(p.effective_per_hour(2.0), p.effective_per_hour(1.0));
    }
}
