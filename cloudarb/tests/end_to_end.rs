//! Exercises the full pricing → arbitrage → optimization pipeline against
//! the deterministic mock fixtures, without touching any real provider.

use std::sync::Arc;
use std::time::Duration;

use cloudarb_aggregator::{AdapterEntry, PricingAggregator};
use cloudarb_arbitrage::ArbitrageDetector;
use cloudarb_mock::{fixtures, MockAdapter};
use cloudarb_optimizer::OptimizationEngine;
use cloudarb_types::{
    AdapterCapabilities, AllocationStatus, ArbitrageConfig, CycleConfig, GpuKind, Objective,
    ProviderId, Region, Request, SolverConfig, WorkloadItem,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn fast_cycle() -> CycleConfig {
    CycleConfig {
        interval: Duration::from_millis(5),
        cycle_deadline: Duration::from_millis(200),
        adapter_timeout: Duration::from_millis(100),
        freshness_ttl: Duration::from_secs(300),
        ..CycleConfig::default()
    }
}

async fn start_aggregator(points_by_provider: Vec<(ProviderId, Vec<cloudarb_types::PricePoint>)>) -> Arc<PricingAggregator> {
    let entries = points_by_provider
        .into_iter()
        .map(|(provider, points)| AdapterEntry {
            adapter: Arc::new(MockAdapter::new(provider, AdapterCapabilities::conventional(), points)),
            regions: vec![Region::new("us-east-1"), Region::new("us-east-2")],
        })
        .collect();
    let (aggregator, _handle) = PricingAggregator::start(entries, fast_cycle());
    tokio::time::sleep(Duration::from_millis(30)).await;
    Arc::new(aggregator)
}

fn points_for(points: Vec<cloudarb_types::PricePoint>, provider: ProviderId) -> Vec<cloudarb_types::PricePoint> {
    points.into_iter().filter(|p| p.line.provider == provider).collect()
}

fn workload(count: u32) -> Vec<WorkloadItem> {
    vec![WorkloadItem {
        gpu_kind: GpuKind::new("A100"),
        min_count: count,
        max_count: count,
        duration_hrs: 1.0,
        label: None,
    }]
}

/// A solve is "solved" if it found a feasible allocation, whether or not
/// the solver could certify it optimal before its deadline.
fn is_solved(status: AllocationStatus) -> bool {
    matches!(status, AllocationStatus::Optimal | AllocationStatus::FeasibleGap)
}

#[tokio::test]
async fn basic_min_cost_picks_the_cheapest_single_gpu_provider() {
    let points = fixtures::basic_three_provider_a100();
    let aggregator = start_aggregator(vec![
        (ProviderId::Aws, points_for(points.clone(), ProviderId::Aws)),
        (ProviderId::Gcp, points_for(points.clone(), ProviderId::Gcp)),
        (ProviderId::LambdaLabs, points_for(points, ProviderId::LambdaLabs)),
    ])
    .await;

    let engine = OptimizationEngine::new(Arc::clone(&aggregator), SolverConfig::default());
    let request = Request {
        workload: workload(4),
        objective: Objective::MinCost,
        risk_tolerance: 0.0,
        budget_per_hour: Some(Decimal::from_str("20.00").unwrap()),
        solve_deadline_ms: None,
        provider_allowlist: Vec::new(),
        region_allowlist: Vec::new(),
    };

    let allocation = engine.quick_optimize(&request).await.unwrap();
    assert!(is_solved(allocation.status));
    assert_eq!(allocation.total_per_hour, Decimal::from_str("9.60").unwrap());
    assert_eq!(allocation.lines.len(), 1);
    assert_eq!(allocation.lines[0].line.provider, ProviderId::LambdaLabs);
}

#[tokio::test]
async fn budget_below_any_feasible_placement_is_infeasible() {
    let points = fixtures::basic_three_provider_a100();
    let aggregator = start_aggregator(vec![
        (ProviderId::Aws, points_for(points.clone(), ProviderId::Aws)),
        (ProviderId::Gcp, points_for(points.clone(), ProviderId::Gcp)),
        (ProviderId::LambdaLabs, points_for(points, ProviderId::LambdaLabs)),
    ])
    .await;

    let engine = OptimizationEngine::new(Arc::clone(&aggregator), SolverConfig::default());
    let request = Request {
        workload: workload(8),
        objective: Objective::MinCost,
        risk_tolerance: 0.0,
        budget_per_hour: Some(Decimal::from_str("5.00").unwrap()),
        solve_deadline_ms: None,
        provider_allowlist: Vec::new(),
        region_allowlist: Vec::new(),
    };

    let allocation = engine.quick_optimize(&request).await.unwrap();
    assert_eq!(allocation.status, AllocationStatus::Infeasible);
}

#[tokio::test]
async fn zero_risk_tolerance_ignores_a_cheaper_aws_spot_quote() {
    let points = fixtures::with_aws_spot_quote();
    let aggregator = start_aggregator(vec![
        (ProviderId::Aws, points_for(points.clone(), ProviderId::Aws)),
        (ProviderId::Gcp, points_for(points.clone(), ProviderId::Gcp)),
        (ProviderId::LambdaLabs, points_for(points, ProviderId::LambdaLabs)),
    ])
    .await;

    let engine = OptimizationEngine::new(Arc::clone(&aggregator), SolverConfig::default());
    let request = Request {
        workload: workload(2),
        objective: Objective::MinCost,
        risk_tolerance: 0.0,
        budget_per_hour: Some(Decimal::from_str("10.00").unwrap()),
        solve_deadline_ms: None,
        provider_allowlist: Vec::new(),
        region_allowlist: Vec::new(),
    };

    let allocation = engine.quick_optimize(&request).await.unwrap();
    assert_eq!(allocation.total_per_hour, Decimal::from_str("4.80").unwrap());
    assert_eq!(allocation.lines[0].line.provider, ProviderId::LambdaLabs);
}

#[tokio::test]
async fn mixed_instance_sizes_prefers_the_single_large_instance() {
    let points = fixtures::mixed_instance_sizes();
    let aggregator = start_aggregator(vec![
        (ProviderId::Aws, points_for(points.clone(), ProviderId::Aws)),
        (ProviderId::LambdaLabs, points_for(points, ProviderId::LambdaLabs)),
    ])
    .await;

    let engine = OptimizationEngine::new(Arc::clone(&aggregator), SolverConfig::default());
    let request = Request {
        workload: workload(8),
        objective: Objective::MinCost,
        risk_tolerance: 0.0,
        budget_per_hour: None,
        solve_deadline_ms: None,
        provider_allowlist: Vec::new(),
        region_allowlist: Vec::new(),
    };

    let allocation = engine.quick_optimize(&request).await.unwrap();
    assert_eq!(allocation.total_per_hour, Decimal::from_str("16.00").unwrap());
    assert_eq!(allocation.lines.len(), 1);
    assert_eq!(allocation.lines[0].line.provider, ProviderId::Aws);
}

#[tokio::test]
async fn arbitrage_gap_is_emitted_once_and_then_suppressed() {
    let points = fixtures::arbitrage_gap();
    let mut cfg = ArbitrageConfig { min_savings_fraction: 0.05, cooldown: Duration::from_secs(300), ..ArbitrageConfig::default() };
    cfg.region_classes.insert(Region::new("us-east-1"), cloudarb_types::RegionClass::new("north-america"));
    cfg.region_classes.insert(Region::new("us-east-2"), cloudarb_types::RegionClass::new("north-america"));

    let aggregator = start_aggregator(vec![
        (ProviderId::Gcp, points_for(points.clone(), ProviderId::Gcp)),
        (ProviderId::LambdaLabs, points_for(points, ProviderId::LambdaLabs)),
    ])
    .await;

    let (detector, _handle) = ArbitrageDetector::start(Arc::clone(&aggregator), cfg, 0.0);
    let mut events = detector.subscribe();

    let first = tokio::time::timeout(Duration::from_millis(200), events.recv()).await.unwrap().unwrap();
    assert!((first.savings_fraction - 0.20).abs() < 1e-9);
    assert_eq!(first.cheap.provider, ProviderId::LambdaLabs);
    assert_eq!(first.expensive.provider, ProviderId::Gcp);

    // A second cycle republishes the same gap; the cooldown suppresses it.
    let second = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
    assert!(second.is_err(), "opportunity should be suppressed within the cooldown window");
}

#[tokio::test]
async fn a_tight_solver_deadline_still_returns_within_its_wall_clock_budget() {
    let points = fixtures::wide_a100_spread(60);
    let regions: Vec<Region> = (0..4).map(|i| Region::new(format!("region-{i}"))).collect();
    let entries = [ProviderId::Aws, ProviderId::Gcp, ProviderId::Azure, ProviderId::LambdaLabs, ProviderId::RunPod]
        .into_iter()
        .map(|provider| AdapterEntry {
            adapter: Arc::new(MockAdapter::new(provider, AdapterCapabilities::conventional(), points_for(points.clone(), provider))),
            regions: regions.clone(),
        })
        .collect();
    let (aggregator, _handle) = PricingAggregator::start(entries, fast_cycle());
    tokio::time::sleep(Duration::from_millis(30)).await;
    let aggregator = Arc::new(aggregator);

    let engine = OptimizationEngine::new(Arc::clone(&aggregator), SolverConfig::default());
    let request = Request {
        workload: (0..20)
            .map(|i| WorkloadItem {
                gpu_kind: GpuKind::new("A100"),
                min_count: i % 4 + 1,
                max_count: i % 4 + 1,
                duration_hrs: 1.0,
                label: None,
            })
            .collect(),
        objective: Objective::MinCost,
        risk_tolerance: 0.0,
        budget_per_hour: None,
        solve_deadline_ms: Some(100),
        provider_allowlist: Vec::new(),
        region_allowlist: Vec::new(),
    };

    let started = std::time::Instant::now();
    let allocation = engine.quick_optimize(&request).await.unwrap();
    assert!(
        started.elapsed() <= Duration::from_millis(150),
        "solve exceeded its wall-clock budget: {:?}",
        started.elapsed()
    );
    assert!(matches!(
        allocation.status,
        AllocationStatus::Optimal | AllocationStatus::FeasibleGap | AllocationStatus::Timeout | AllocationStatus::Infeasible
    ));
}
