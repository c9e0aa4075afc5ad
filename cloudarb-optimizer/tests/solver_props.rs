//! Property tests for the MILP solver: feasibility, bounds, and the two
//! monotonicity guarantees a cost-minimizing solve must uphold.

use std::collections::BTreeMap;

use cloudarb_optimizer::solve;
use cloudarb_types::{
    GpuKind, InstanceType, Line, Objective, PricePoint, PricingTable, ProviderId, Region, Request,
    SolverConfig, WorkloadItem,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

const PROVIDERS: [ProviderId; 5] = [
    ProviderId::Aws,
    ProviderId::Gcp,
    ProviderId::Azure,
    ProviderId::LambdaLabs,
    ProviderId::RunPod,
];

fn gpu_kind() -> GpuKind {
    GpuKind::new("A100")
}

fn candidate_point(index: usize, cents: u32) -> PricePoint {
    let provider = PROVIDERS[index % PROVIDERS.len()];
    let instance = format!("inst-{index}");
    PricePoint {
        line: Line::new(provider, instance.clone(), Region::new("us-east-1")),
        instance: InstanceType {
            name: instance,
            gpu_kind: gpu_kind(),
            gpu_count: 1,
            vcpus: None,
            memory_gib: None,
        },
        on_demand_per_hour: Decimal::new(i64::from(cents), 2),
        spot_per_hour: None,
        observed_at: chrono::Utc::now(),
    }
}

fn table_from(points: Vec<PricePoint>) -> PricingTable {
    let mut prices = BTreeMap::new();
    for p in points {
        prices.insert(p.line.clone(), p);
    }
    PricingTable { generation: 1, prices, published_at: None }
}

fn request(count: u32, budget: Option<Decimal>) -> Request {
    Request {
        workload: vec![WorkloadItem {
            gpu_kind: gpu_kind(),
            min_count: count,
            max_count: count,
            duration_hrs: 1.0,
            label: None,
        }],
        objective: Objective::MinCost,
        risk_tolerance: 0.0,
        budget_per_hour: budget,
        solve_deadline_ms: None,
        provider_allowlist: Vec::new(),
        region_allowlist: Vec::new(),
    }
}

/// A solve is "solved" if it found a feasible allocation, whether or not
/// the solver could certify it optimal before its deadline.
fn is_solved(status: cloudarb_types::AllocationStatus) -> bool {
    matches!(status, cloudarb_types::AllocationStatus::Optimal | cloudarb_types::AllocationStatus::FeasibleGap)
}

/// Non-empty sets of distinct per-instance on-demand prices, in cents, so
/// every candidate price is exact and free of floating-point drift.
fn arb_prices() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..10_000, 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// An unconstrained solve (no budget ceiling) over a non-empty candidate
    /// set always finds a feasible allocation: demand is small enough that
    /// any single candidate can cover it alone.
    #[test]
    fn feasible_when_candidates_exist_and_budget_is_unbounded(
        prices in arb_prices(),
        count in 1u32..20,
    ) {
        let points: Vec<PricePoint> = prices.iter().enumerate().map(|(i, &c)| candidate_point(i, c)).collect();
        let table = table_from(points);
        let req = request(count, None);
        let cfg = SolverConfig::default();
        let alloc = solve(&table, &req, &cfg).unwrap();
        prop_assert!(is_solved(alloc.status));
    }

    /// Every satisfied allocation delivers exactly the demanded GPU count
    /// and never exceeds its budget.
    #[test]
    fn satisfied_allocations_respect_demand_and_budget(
        prices in arb_prices(),
        count in 1u32..20,
        budget_cents in 0u32..200_000,
    ) {
        let points: Vec<PricePoint> = prices.iter().enumerate().map(|(i, &c)| candidate_point(i, c)).collect();
        let table = table_from(points);
        let budget = Decimal::new(i64::from(budget_cents), 2);
        let req = request(count, Some(budget));
        let cfg = SolverConfig::default();
        let alloc = solve(&table, &req, &cfg).unwrap();
        if is_solved(alloc.status) {
            prop_assert_eq!(alloc.total_gpus(), count);
            prop_assert!(alloc.total_per_hour <= budget);
        }
    }

    /// Tightening the budget can only hold the optimal cost steady or push
    /// it up; it can never make a `MinCost` solve cheaper.
    #[test]
    fn tighter_budget_never_decreases_optimal_cost(
        prices in arb_prices(),
        count in 1u32..10,
        loose_cents in 0u32..200_000,
        delta_cents in 0u32..50_000,
    ) {
        let points: Vec<PricePoint> = prices.iter().enumerate().map(|(i, &c)| candidate_point(i, c)).collect();
        let table = table_from(points);
        let loose_budget = Decimal::new(i64::from(loose_cents + delta_cents), 2);
        let tight_budget = Decimal::new(i64::from(loose_cents), 2);
        let cfg = SolverConfig::default();

        let loose = solve(&table, &request(count, Some(loose_budget)), &cfg).unwrap();
        let tight = solve(&table, &request(count, Some(tight_budget)), &cfg).unwrap();

        if is_solved(loose.status) && is_solved(tight.status) {
            prop_assert!(tight.total_per_hour >= loose.total_per_hour);
        }
    }

    /// Adding a line strictly cheaper than every existing candidate never
    /// raises the optimal cost.
    #[test]
    fn a_strictly_cheaper_line_never_increases_optimal_cost(
        prices in arb_prices(),
        count in 1u32..10,
    ) {
        let before_points: Vec<PricePoint> = prices.iter().enumerate().map(|(i, &c)| candidate_point(i, c)).collect();
        let min_price = *prices.iter().min().unwrap();
        prop_assume!(min_price > 1);
        let cheaper = candidate_point(before_points.len(), min_price - 1);

        let before_table = table_from(before_points.clone());
        let mut after_points = before_points;
        after_points.push(cheaper);
        let after_table = table_from(after_points);

        let cfg = SolverConfig::default();
        let req = request(count, None);
        let before = solve(&before_table, &req, &cfg).unwrap();
        let after = solve(&after_table, &req, &cfg).unwrap();

        prop_assert!(is_solved(before.status));
        prop_assert!(is_solved(after.status));
        prop_assert!(after.total_per_hour <= before.total_per_hour);
    }
}
