//! MILP formulation: candidate lines, decision variables, objective,
//! constraints, and solution extraction.

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel};
use rust_decimal::Decimal;

use cloudarb_types::{
    Allocation, AllocationLine, AllocationStatus, CloudArbError, GpuKind, Objective, PricePoint,
    PricingTable, Request, SolverConfig,
};

/// One priced line eligible to serve some workload item, with its
/// risk-tolerance-blended effective price already resolved.
#[derive(Debug, Clone)]
struct Candidate<'a> {
    point: &'a PricePoint,
    effective_per_hour: f64,
    /// Position in the stable (BTreeMap) iteration order, used only to
    /// break ties deterministically.
    rank: usize,
}

fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Collect, per workload item, every candidate line serving its GPU kind
/// that is also permitted by the request's provider/region allowlists (an
/// empty allowlist permits every provider/region).
fn candidates_by_kind<'a>(
    table: &'a PricingTable,
    kinds: &[GpuKind],
    risk_tolerance: f64,
    request: &Request,
) -> std::collections::HashMap<GpuKind, Vec<Candidate<'a>>> {
    let mut out: std::collections::HashMap<GpuKind, Vec<Candidate<'a>>> = Default::default();
    for kind in kinds {
        let candidates = table
            .by_gpu_kind(kind)
            .filter(|point| {
                (request.provider_allowlist.is_empty() || request.provider_allowlist.contains(&point.line.provider))
                    && (request.region_allowlist.is_empty() || request.region_allowlist.contains(&point.line.region))
            })
            .enumerate()
            .map(|(rank, point)| Candidate {
                point,
                effective_per_hour: decimal_to_f64(point.effective_per_hour(risk_tolerance)),
                rank,
            })
            .collect();
        out.insert(kind.clone(), candidates);
    }
    out
}

fn cost_weight(objective: Objective) -> f64 {
    match objective {
        Objective::MinCost => 1.0,
        Objective::MaxPerformance => 0.0,
        Objective::Balanced { cost_weight } => cost_weight,
    }
}

/// Solve a single optimization request against a pricing snapshot.
///
/// Every requested GPU kind must land within its `[min_count, max_count]`
/// range for `status` to come back `Optimal`/`FeasibleGap`; if the pricing
/// table has no candidate lines for a demanded kind, or the budget cannot
/// accommodate the minimum workload, the solve returns `Infeasible` rather
/// than attempting a partial placement: CloudArb always resolves demand
/// within range or not at all.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "cloudarb_optimizer::model::solve", skip(table, request, cfg), fields(generation = table.generation, items = request.workload.len()))
)]
pub fn solve(table: &PricingTable, request: &Request, cfg: &SolverConfig) -> Result<Allocation, CloudArbError> {
    request.validate()?;

    let kinds: Vec<GpuKind> = request.workload.iter().map(|w| w.gpu_kind.clone()).collect();
    let by_kind = candidates_by_kind(table, &kinds, request.risk_tolerance, request);

    for item in &request.workload {
        if by_kind.get(&item.gpu_kind).map_or(true, Vec::is_empty) {
            return Ok(infeasible(
                table.generation,
                format!("no priced lines available for GPU kind {} within the requested allowlists", item.gpu_kind),
            ));
        }
    }

    let mut vars = variables!();
    // Flattened (workload_index, candidate_index) -> variable, in the order
    // workload items and their candidates are visited below.
    let mut counts: Vec<Vec<good_lp::Variable>> = Vec::with_capacity(request.workload.len());
    for item in &request.workload {
        let candidates = &by_kind[&item.gpu_kind];
        let row: Vec<good_lp::Variable> = candidates
            .iter()
            .map(|c| {
                vars.add(
                    variable()
                        .integer()
                        .min(0.0)
                        .max(f64::from(item.max_count))
                        .name(format!("count_{}_{}", item.gpu_kind, c.rank)),
                )
            })
            .collect();
        counts.push(row);
    }

    let total_cost: Expression = request
        .workload
        .iter()
        .enumerate()
        .flat_map(|(wi, item)| {
            by_kind[&item.gpu_kind]
                .iter()
                .enumerate()
                .map(move |(ci, c)| counts[wi][ci] * c.effective_per_hour)
        })
        .sum();

    let total_instances: Expression = request
        .workload
        .iter()
        .enumerate()
        .flat_map(|(wi, item)| (0..by_kind[&item.gpu_kind].len()).map(move |ci| counts[wi][ci] * 1.0))
        .sum();

    let tie_break: Expression = request
        .workload
        .iter()
        .enumerate()
        .flat_map(|(wi, item)| {
            by_kind[&item.gpu_kind]
                .iter()
                .enumerate()
                .map(move |(ci, c)| counts[wi][ci] * (c.rank as f64))
        })
        .sum();

    let weight = cost_weight(request.objective);
    // Scale the instance-count term to roughly the same magnitude as the
    // cost term so a `Balanced` weight genuinely trades one against the
    // other, rather than the cost term swamping it (or vice versa). Using
    // fewer, denser instances is the available proxy for "performance"
    // once demand is pinned to an exact count: total delivered GPUs is
    // otherwise identical across every feasible solution.
    let avg_price: f64 = {
        let all: Vec<f64> = by_kind.values().flatten().map(|c| c.effective_per_hour).collect();
        if all.is_empty() { 1.0 } else { all.iter().sum::<f64>() / all.len() as f64 }
    };
    let objective = total_cost.clone() * weight
        + total_instances * ((1.0 - weight) * avg_price)
        + tie_break * cfg.tie_break_epsilon;

    let time_limit = request
        .solve_deadline_ms
        .map(|ms| ms as f64 / 1000.0)
        .unwrap_or_else(|| cfg.default_deadline.as_secs_f64());
    let mut problem = vars.minimise(objective).using(highs).set_time_limit(time_limit);

    for (wi, item) in request.workload.iter().enumerate() {
        let candidates = &by_kind[&item.gpu_kind];
        let delivered: Expression = candidates
            .iter()
            .enumerate()
            .map(|(ci, c)| counts[wi][ci] * f64::from(c.point.instance.gpu_count))
            .sum();
        problem = problem.with(constraint!(delivered.clone() >= f64::from(item.min_count)));
        problem = problem.with(constraint!(delivered <= f64::from(item.max_count)));
    }

    if let Some(budget) = request.budget_per_hour {
        problem = problem.with(constraint!(total_cost.clone() <= decimal_to_f64(budget)));
    }

    // good_lp's portable `Solution` surface does not expose HiGHS's internal
    // MIP gap, so the deadline itself is the only signal available for
    // telling "proved optimal" apart from "timed out with an incumbent
    // still in hand": if the solve consumed nearly all of its time budget,
    // treat whatever it returned as unproven rather than optimal.
    let started = std::time::Instant::now();
    let solve_result = problem.solve();
    let ran_out_of_time = started.elapsed().as_secs_f64() >= time_limit * 0.9;

    let solution = match solve_result {
        Ok(s) => s,
        Err(good_lp::ResolutionError::Infeasible) => {
            return Ok(if ran_out_of_time {
                timed_out(
                    table.generation,
                    "solve deadline elapsed before any feasible allocation was found".to_string(),
                )
            } else {
                infeasible(
                    table.generation,
                    "no allocation satisfies the full workload within the given budget".to_string(),
                )
            });
        }
        Err(e) => return Err(CloudArbError::solver_failure(e.to_string())),
    };

    let mut lines = Vec::new();
    let mut total_per_hour = Decimal::ZERO;
    for (wi, item) in request.workload.iter().enumerate() {
        let candidates = &by_kind[&item.gpu_kind];
        for (ci, candidate) in candidates.iter().enumerate() {
            let count = solution.value(counts[wi][ci]).round() as i64;
            if count <= 0 {
                continue;
            }
            let instance_count = count as u32;
            let gpu_count = instance_count * candidate.point.instance.gpu_count;
            let effective_per_hour = candidate.point.effective_per_hour(request.risk_tolerance);
            total_per_hour += effective_per_hour * Decimal::from(instance_count);
            lines.push(AllocationLine {
                line: candidate.point.line.clone(),
                instance_count,
                gpu_count,
                effective_per_hour,
            });
        }
    }

    let (status, optimality_gap) = if ran_out_of_time {
        (AllocationStatus::FeasibleGap, None)
    } else {
        (AllocationStatus::Optimal, Some(0.0))
    };

    Ok(Allocation {
        status,
        lines,
        total_per_hour,
        pricing_generation: table.generation,
        solved_at: chrono::Utc::now(),
        optimality_gap,
        explanation: None,
    })
}

fn infeasible(generation: cloudarb_types::Generation, explanation: String) -> Allocation {
    Allocation {
        status: AllocationStatus::Infeasible,
        lines: Vec::new(),
        total_per_hour: Decimal::ZERO,
        pricing_generation: generation,
        solved_at: chrono::Utc::now(),
        optimality_gap: None,
        explanation: Some(explanation),
    }
}

fn timed_out(generation: cloudarb_types::Generation, explanation: String) -> Allocation {
    Allocation {
        status: AllocationStatus::Timeout,
        lines: Vec::new(),
        total_per_hour: Decimal::ZERO,
        pricing_generation: generation,
        solved_at: chrono::Utc::now(),
        optimality_gap: None,
        explanation: Some(explanation),
    }
}
