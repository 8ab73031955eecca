//! Backends built on `good_lp`.

use ::good_lp::solvers::{SolutionStatus as LpStatus, WithMipGap, WithTimeLimit};
use ::good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use std::time::Instant;
use tracing::debug;

use super::{MilpSolver, SolverOutput};
use crate::model::{Model, Sense, VarKind};
use crate::types::SolverConfig;

/// microlp gives up with this when the time limit expires before any incumbent.
const MICROLP_NO_INCUMBENT: &str = "Time limit reached before finding a feasible solution";
/// HiGHS stopped on a limit without a primal feasible point.
const HIGHS_NO_INCUMBENT: &str = "NoSolutionFound";
/// Longer limits are passed as this; microlp converts to a `Duration`.
const MAX_TIME_LIMIT: f64 = 1e9;

/// The model expressed with `good_lp` handles, ready to hand to any of its solvers.
struct Translated {
    vars: ProblemVariables,
    handles: Vec<Variable>,
    objective: Expression,
    constraints: Vec<::good_lp::Constraint>,
}

fn translate(model: &Model) -> Translated {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|var| {
            let definition = match var.kind {
                VarKind::Binary => variable().integer(),
                VarKind::Continuous => variable(),
            };
            vars.add(
                definition
                    .min(var.lower)
                    .max(var.upper)
                    .name(var.name.clone()),
            )
        })
        .collect();

    let linear = |terms: &[(crate::model::VarId, f64)], sign: f64| -> Expression {
        terms
            .iter()
            .map(|&(var, coeff)| (sign * coeff) * handles[var.index()])
            .sum()
    };

    let objective = linear(model.objective(), 1.0);
    let constraints = model
        .constraints()
        .iter()
        .map(|c| match c.sense {
            Sense::Le => constraint::leq(linear(&c.terms, 1.0), Expression::from(c.rhs)),
            Sense::Ge => constraint::leq(linear(&c.terms, -1.0), Expression::from(-c.rhs)),
            Sense::Eq => constraint::eq(linear(&c.terms, 1.0), Expression::from(c.rhs)),
        })
        .collect();

    Translated {
        vars,
        handles,
        objective,
        constraints,
    }
}

fn collect_values(
    model: &Model,
    handles: &[Variable],
    solution: &impl Solution,
) -> (Vec<f64>, f64) {
    let values: Vec<f64> = handles.iter().map(|&h| solution.value(h)).collect();
    let objective = model.evaluate(&values);
    (values, objective)
}

/// A solution stopped by a time or gap limit is only feasible.
fn from_status(status: LpStatus, values: Vec<f64>, objective: f64) -> SolverOutput {
    match status {
        LpStatus::Optimal => SolverOutput::optimal(values, objective),
        LpStatus::TimeLimit | LpStatus::GapLimit => SolverOutput::feasible(values, objective),
    }
}

fn resolution_failure(err: ResolutionError) -> SolverOutput {
    match err {
        ResolutionError::Infeasible => SolverOutput::infeasible(),
        ResolutionError::Other(MICROLP_NO_INCUMBENT | HIGHS_NO_INCUMBENT) => SolverOutput::timeout(),
        other => SolverOutput::error(other.to_string()),
    }
}

/// Applies the limits from `config`, adds the constraints and solves.
fn solve_limited<P>(
    name: &str,
    problem: P,
    constraints: Vec<::good_lp::Constraint>,
    model: &Model,
    handles: &[Variable],
    config: &SolverConfig,
) -> SolverOutput
where
    P: SolverModel<Error = ResolutionError> + WithTimeLimit + WithMipGap,
{
    let problem = problem.with_time_limit(config.time_limit.min(MAX_TIME_LIMIT));
    let mut problem = match problem.with_mip_gap(config.mip_gap as f32) {
        Ok(problem) => problem,
        Err(err) => return SolverOutput::error(format!("{} rejected mip_gap: {}", name, err)),
    };
    for c in constraints {
        problem = problem.with(c);
    }

    debug!(
        backend = name,
        time_limit = config.time_limit,
        mip_gap = config.mip_gap,
        "Solving"
    );
    let start = Instant::now();
    let result = problem.solve();
    debug!(
        backend = name,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Solver finished"
    );

    match result {
        Ok(solution) => {
            let (values, objective) = collect_values(model, handles, &solution);
            from_status(solution.status(), values, objective)
        }
        Err(err) => resolution_failure(err),
    }
}

/// Pure Rust backend (`microlp` through `good_lp`). Honours `time_limit` and
/// `mip_gap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl MilpSolver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, model: &Model, config: &SolverConfig) -> SolverOutput {
        let Translated {
            vars,
            handles,
            objective,
            constraints,
        } = translate(model);

        let problem = vars.minimise(objective).using(::good_lp::microlp);
        solve_limited(self.name(), problem, constraints, model, &handles, config)
    }
}

/// HiGHS backend. Honours `time_limit` and `mip_gap`.
#[cfg(feature = "highs")]
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

#[cfg(feature = "highs")]
impl MilpSolver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, model: &Model, config: &SolverConfig) -> SolverOutput {
        let Translated {
            vars,
            handles,
            objective,
            constraints,
        } = translate(model);

        let problem = vars.minimise(objective).using(::good_lp::highs);
        solve_limited(self.name(), problem, constraints, model, &handles, config)
    }
}
