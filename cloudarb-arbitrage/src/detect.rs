//! Pure detection logic: compare lines within a region class, find gaps.

use std::collections::HashMap;

use chrono::Utc;
use cloudarb_types::{ArbitrageConfig, GpuKind, Opportunity, PricePoint, PricingTable, RegionClass};

/// Find every opportunity in `table` that clears `cfg.min_savings_fraction`,
/// comparing lines only within the same `(gpu_kind, region_class)` group.
///
/// For each group, the single cheapest line is the arbitrage target; every
/// other line in the group that is more expensive than it by at least the
/// threshold produces one `Opportunity`. This avoids reporting the same
/// gap from both directions or emitting `O(n^2)` pairs within a group.
#[must_use]
pub fn detect(table: &PricingTable, cfg: &ArbitrageConfig, risk_tolerance: f64) -> Vec<Opportunity> {
    let mut groups: HashMap<(GpuKind, RegionClass), Vec<&PricePoint>> = HashMap::new();
    for point in table.prices.values() {
        let class = cfg.class_for(&point.line.region);
        groups
            .entry((point.instance.gpu_kind.clone(), class))
            .or_default()
            .push(point);
    }

    let now = Utc::now();
    let mut opportunities = Vec::new();
    for ((gpu_kind, region_class), mut points) in groups {
        if points.len() < 2 {
            continue;
        }
        points.sort_by(|a, b| {
            a.effective_per_hour(risk_tolerance)
                .cmp(&b.effective_per_hour(risk_tolerance))
        });
        let cheap = points[0];
        let cheap_price = cheap.effective_per_hour(risk_tolerance);
        if cheap_price.is_zero() {
            continue;
        }
        for expensive in &points[1..] {
            let expensive_price = expensive.effective_per_hour(risk_tolerance);
            let savings_fraction = ((expensive_price - cheap_price) / expensive_price)
                .to_string()
                .parse::<f64>()
                .unwrap_or(0.0);
            if savings_fraction < cfg.min_savings_fraction {
                continue;
            }
            opportunities.push(Opportunity {
                gpu_kind: gpu_kind.clone(),
                region_class: region_class.clone(),
                expensive: expensive.line.clone(),
                cheap: cheap.line.clone(),
                expensive_per_hour: expensive_price,
                cheap_per_hour: cheap_price,
                savings_fraction,
                risk_score: risk_score(cheap, expensive, risk_tolerance),
                detected_at: now,
            });
        }
    }
    opportunities
}

/// Weighted average of three risk signals for switching from `expensive`
/// to `cheap`, each normalized to `[0, 1]`:
/// - spot-share of `cheap`'s effective price (no spot quote scores 0);
/// - a provider-diversity bonus: moving to a different provider scores
///   lower than staying on the same one;
/// - a region-distance penalty: a cross-region switch scores higher.
fn risk_score(cheap: &PricePoint, expensive: &PricePoint, risk_tolerance: f64) -> f64 {
    let spot_component = if cheap.spot_per_hour.is_some() {
        risk_tolerance.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let diversity_component = if cheap.line.provider == expensive.line.provider { 1.0 } else { 0.0 };
    let distance_component = if cheap.line.region == expensive.line.region { 0.0 } else { 1.0 };
    (spot_component + diversity_component + distance_component) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudarb_types::{InstanceType, Line, ProviderId, Region};
    use std::str::FromStr;

    fn point(provider: ProviderId, region: &str, price: &str) -> PricePoint {
        PricePoint {
            line: Line::new(provider, "instance", Region::new(region)),
            instance: InstanceType {
                name: "instance".into(),
                gpu_kind: GpuKind::new("A100"),
                gpu_count: 1,
                vcpus: None,
                memory_gib: None,
            },
            on_demand_per_hour: rust_decimal::Decimal::from_str(price).unwrap(),
            spot_per_hour: None,
            observed_at: Utc::now(),
        }
    }

    fn config_with(min_savings: f64) -> ArbitrageConfig {
        let mut cfg = ArbitrageConfig::default();
        cfg.min_savings_fraction = min_savings;
        cfg.region_classes.insert(Region::new("us-region"), RegionClass::new("north-america"));
        cfg.region_classes.insert(Region::new("us-region-2"), RegionClass::new("north-america"));
        cfg
    }

    #[test]
    fn detects_a_gap_above_threshold() {
        let mut table = PricingTable::empty();
        let cheap = point(ProviderId::LambdaLabs, "us-region", "0.80");
        let expensive = point(ProviderId::Gcp, "us-region-2", "1.00");
        table.prices.insert(cheap.line.clone(), cheap);
        table.prices.insert(expensive.line.clone(), expensive);

        let cfg = config_with(0.15);
        let found = detect(&table, &cfg, 0.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cheap.provider, ProviderId::LambdaLabs);
        assert_eq!(found[0].expensive.provider, ProviderId::Gcp);
    }

    #[test]
    fn does_not_report_a_gap_below_threshold() {
        let mut table = PricingTable::empty();
        let cheap = point(ProviderId::LambdaLabs, "us-region", "0.95");
        let expensive = point(ProviderId::Gcp, "us-region-2", "1.00");
        table.prices.insert(cheap.line.clone(), cheap);
        table.prices.insert(expensive.line.clone(), expensive);

        let cfg = config_with(0.15);
        assert!(detect(&table, &cfg, 0.0).is_empty());
    }

    #[test]
    fn risk_score_penalizes_spot_share_diversity_and_distance() {
        let mut cheap = point(ProviderId::LambdaLabs, "us-region", "0.80");
        cheap.spot_per_hour = Some(rust_decimal::Decimal::from_str("0.60").unwrap());
        let expensive = point(ProviderId::Gcp, "us-region-2", "1.00");
        // Different provider (diversity bonus, 0), different region (penalty, 1),
        // fully spot-weighted (risk_tolerance 1.0) -> (1 + 0 + 1) / 3.
        assert!((risk_score(&cheap, &expensive, 1.0) - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn risk_score_is_zero_for_a_same_provider_same_region_on_demand_switch() {
        let cheap = point(ProviderId::LambdaLabs, "us-region", "0.80");
        let expensive = point(ProviderId::LambdaLabs, "us-region", "1.00");
        assert_eq!(risk_score(&cheap, &expensive, 0.5), 0.0);
    }

    #[test]
    fn unmapped_regions_are_never_compared() {
        let mut table = PricingTable::empty();
        let a = point(ProviderId::LambdaLabs, "region-a", "0.80");
        let b = point(ProviderId::Gcp, "region-b", "1.00");
        table.prices.insert(a.line.clone(), a);
        table.prices.insert(b.line.clone(), b);

        let cfg = ArbitrageConfig { min_savings_fraction: 0.01, ..ArbitrageConfig::default() };
        assert!(detect(&table, &cfg, 0.0).is_empty());
    }
}
