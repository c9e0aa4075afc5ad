//! Deterministic pricing fixtures mirroring the reference end-to-end
//! scenarios: fixed providers, fixed prices, fixed instance shapes.

use chrono::Utc;
use cloudarb_types::{GpuKind, InstanceType, Line, PricePoint, ProviderId, Region};
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("fixture literal is a valid decimal")
}

fn single_gpu_point(provider: ProviderId, instance: &str, region: &str, on_demand: &str, spot: Option<&str>) -> PricePoint {
    PricePoint {
        line: Line::new(provider, instance, Region::new(region)),
        instance: InstanceType {
            name: instance.into(),
            gpu_kind: GpuKind::new("A100"),
            gpu_count: 1,
            vcpus: None,
            memory_gib: None,
        },
        on_demand_per_hour: dec(on_demand),
        spot_per_hour: spot.map(dec),
        observed_at: Utc::now(),
    }
}

/// AWS/GCP/Lambda single-GPU A100 instances at 3.00/2.50/2.40 $/hr, all in
/// `us-east-1`, as used by the basic min-cost and budget-infeasibility
/// scenarios.
#[must_use]
pub fn basic_three_provider_a100() -> Vec<PricePoint> {
    vec![
        single_gpu_point(ProviderId::Aws, "p4d.xlarge", "us-east-1", "3.00", None),
        single_gpu_point(ProviderId::Gcp, "a2-highgpu-1g", "us-east-1", "2.50", None),
        single_gpu_point(ProviderId::LambdaLabs, "gpu_1x_a100", "us-east-1", "2.40", None),
    ]
}

/// `basic_three_provider_a100` with an additional AWS spot quote at
/// 1.00 $/hr on the same line, for the risk-tolerance blending scenario.
#[must_use]
pub fn with_aws_spot_quote() -> Vec<PricePoint> {
    let mut points = basic_three_provider_a100();
    if let Some(aws) = points.iter_mut().find(|p| p.line.provider == ProviderId::Aws) {
        aws.spot_per_hour = Some(dec("1.00"));
    }
    points
}

/// An 8-GPU AWS instance at 16.00 $/hr alongside a 1-GPU Lambda Labs
/// instance at 2.40 $/hr, for the mixed-instance-size scenario.
#[must_use]
pub fn mixed_instance_sizes() -> Vec<PricePoint> {
    vec![
        PricePoint {
            line: Line::new(ProviderId::Aws, "p4d.24xlarge", Region::new("us-east-1")),
            instance: InstanceType {
                name: "p4d.24xlarge".into(),
                gpu_kind: GpuKind::new("A100"),
                gpu_count: 8,
                vcpus: Some(96),
                memory_gib: Some(1152),
            },
            on_demand_per_hour: dec("16.00"),
            spot_per_hour: None,
            observed_at: Utc::now(),
        },
        single_gpu_point(ProviderId::LambdaLabs, "gpu_1x_a100", "us-east-1", "2.40", None),
    ]
}

/// GCP and Lambda Labs A100 lines in the same region class with a 20%
/// price gap, for the arbitrage-emission scenario.
#[must_use]
pub fn arbitrage_gap() -> Vec<PricePoint> {
    vec![
        single_gpu_point(ProviderId::Gcp, "a2-highgpu-1g", "us-east-1", "3.00", None),
        single_gpu_point(ProviderId::LambdaLabs, "gpu_1x_a100", "us-east-2", "2.40", None),
    ]
}

/// `count` distinct single-GPU A100 lines spread across all five providers
/// and four regions at varying prices, for exercising a solve against a
/// large candidate set under a tight solver deadline.
#[must_use]
pub fn wide_a100_spread(count: usize) -> Vec<PricePoint> {
    let providers = [
        ProviderId::Aws,
        ProviderId::Gcp,
        ProviderId::Azure,
        ProviderId::LambdaLabs,
        ProviderId::RunPod,
    ];
    (0..count)
        .map(|i| {
            let provider = providers[i % providers.len()];
            let cents = 150 + (i * 7) % 500;
            let instance = format!("wide-a100-{i}");
            let region = format!("region-{}", i % 4);
            single_gpu_point(
                provider,
                &instance,
                &region,
                &format!("{}.{:02}", cents / 100, cents % 100),
                None,
            )
        })
        .collect()
}
