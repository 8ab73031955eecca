use crate::decoder::decode;
use crate::model::{build_model, Model};
use crate::problem::PackingProblem;
use crate::solver::{MilpSolver, SolverOutput};
use crate::types::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[cfg(test)]
mod tests;

/// Packs rectangular items into bins by building and solving a MILP.
pub struct Packer {
    problem: PackingProblem,
    solver: SolverConfig,
}

impl Packer {
    /// Validates requests and builds a new packer instance.
    pub fn new(request: PackingRequest) -> Result<Self> {
        let problem = PackingProblem::new(&request.items, &request.bin_types, &request.costs)?;
        Self::from_problem(problem, request.solver)
    }

    pub fn from_problem(problem: PackingProblem, solver: SolverConfig) -> Result<Self> {
        if !solver.time_limit.is_finite() || solver.time_limit <= 0.0 {
            return Err(PackingError::InvalidInput(format!(
                "time_limit must be a positive number of seconds, got {}",
                solver.time_limit
            )));
        }

        if !solver.mip_gap.is_finite() || solver.mip_gap < 0.0 {
            return Err(PackingError::InvalidInput(format!(
                "mip_gap must be non-negative, got {}",
                solver.mip_gap
            )));
        }

        Ok(Self { problem, solver })
    }

    pub fn problem(&self) -> &PackingProblem {
        &self.problem
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver
    }

    pub fn build_model(&self) -> Model {
        build_model(&self.problem)
    }

    /// Solves with the backend named in the solver configuration.
    pub fn pack(&self) -> Result<PackingResult> {
        if self.problem.items.is_empty() {
            return Ok(PackingResult::empty());
        }
        let solver = self.solver.backend.instance()?;
        self.pack_with(solver.as_ref())
    }

    /// Executes the full flow against an explicit backend: build, solve, decode.
    pub fn pack_with(&self, solver: &dyn MilpSolver) -> Result<PackingResult> {
        if self.problem.items.is_empty() {
            return Ok(PackingResult::empty());
        }

        if let Some(i) = self.problem.unplaceable_item() {
            let item = &self.problem.items[i];
            warn!(
                item = i,
                width = item.width,
                height = item.height,
                "Item fits no bin type in any permitted orientation"
            );
            return Err(PackingError::Infeasible);
        }

        let model = self.build_model();
        info!(
            backend = solver.name(),
            items = self.problem.num_items(),
            bin_types = self.problem.num_bin_types(),
            variables = model.num_variables(),
            constraints = model.constraints().len(),
            "Solving packing model"
        );

        let output = solver.solve(&model, &self.solver);
        interpret(&model, output)
    }
}

/// Maps a backend outcome onto a packing result or the matching error.
pub fn interpret(model: &Model, output: SolverOutput) -> Result<PackingResult> {
    let status = match output.status {
        SolutionStatus::Optimal => SolutionStatus::Optimal,
        SolutionStatus::Feasible | SolutionStatus::Timeout if output.values.is_some() => {
            SolutionStatus::Feasible
        }
        SolutionStatus::Feasible | SolutionStatus::Timeout => {
            return Err(PackingError::TimeLimitExceeded)
        }
        SolutionStatus::Infeasible => return Err(PackingError::Infeasible),
        SolutionStatus::Error => return Err(PackingError::Solver(output.message)),
    };

    let values = output.values.ok_or_else(|| {
        PackingError::MalformedSolution("solver reported success without values".to_string())
    })?;
    let decoded = decode(model, &values)?;
    let objective = output.objective.unwrap_or_else(|| model.evaluate(&values));

    let mut bins_required = BTreeMap::new();
    for bin in &decoded.bins {
        *bins_required.entry(bin.bin_type_id.clone()).or_insert(0) += 1;
    }

    if status == SolutionStatus::Feasible {
        warn!(
            bins = decoded.bins.len(),
            total_cost = decoded.total_cost,
            "Returning a packing that may be suboptimal"
        );
    } else {
        info!(
            bins = decoded.bins.len(),
            total_cost = decoded.total_cost,
            objective,
            "Packing solved to optimality"
        );
    }

    Ok(PackingResult {
        bins: decoded.bins,
        total_cost: decoded.total_cost,
        objective,
        status,
        bins_required,
    })
}
