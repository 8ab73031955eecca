//! Two-dimensional bin packing with variable bin sizes and costs, formulated as
//! a mixed-integer linear program.
//!
//! Items may optionally be rotated by 90 degrees, and the unused margin left
//! in each bin can be priced so the solver prefers tight packings. The crate
//! builds the model ([`model::build_model`]), hands it to a MILP backend
//! ([`solver::MilpSolver`]) and decodes the backend's values into bins and
//! placements ([`decoder::decode`]).
//!
//! ```no_run
//! use binpack_core::{solve, BinType, CostConfig, Item, SolverConfig};
//!
//! let items = vec![Item::new(10.0, 20.0).rotatable(), Item::new(20.0, 20.0)];
//! let bins = vec![BinType::new(30.0, 30.0, 9.0), BinType::new(40.0, 40.0, 16.0)];
//! let (bins, cost) = solve(&items, &bins, &CostConfig::default(), &SolverConfig::default())?;
//! println!("{} bins, cost {}", bins.len(), cost);
//! # Ok::<(), binpack_core::PackingError>(())
//! ```

pub mod decoder;
pub mod model;
mod packer;
pub mod problem;
pub mod solver;
mod types;

pub use packer::{interpret, Packer};
pub use problem::PackingProblem;
pub use solver::{MilpSolver, SolverBackend, SolverOutput};
pub use types::*;

/// Packs `items` into bins of the given types and returns the used bins with
/// their placements, together with the summed cost of those bins.
pub fn solve(
    items: &[Item],
    bin_types: &[BinType],
    costs: &CostConfig,
    solver: &SolverConfig,
) -> Result<(Vec<PackedBin>, f64)> {
    let problem = PackingProblem::new(items, bin_types, costs)?;
    let result = Packer::from_problem(problem, solver.clone())?.pack()?;
    Ok((result.bins, result.total_cost))
}
