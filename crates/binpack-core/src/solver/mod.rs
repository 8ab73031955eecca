//! MILP backends.
//!
//! The packer only talks to [`MilpSolver`]; concrete backends translate the
//! backend-agnostic [`Model`] into their own API and report back a flat value
//! vector indexed by [`VarId`](crate::model::VarId).

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::types::*;

mod backends;

pub use self::backends::MicroLpSolver;
#[cfg(feature = "highs")]
pub use self::backends::HighsSolver;

/// What a backend hands back after one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub status: SolutionStatus,
    /// One value per model variable, present whenever a feasible point was found
    pub values: Option<Vec<f64>>,
    pub objective: Option<f64>,
    pub message: String,
}

impl SolverOutput {
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values: Some(values),
            objective: Some(objective),
            message: "Optimal solution found".to_string(),
        }
    }

    pub fn feasible(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: SolutionStatus::Feasible,
            values: Some(values),
            objective: Some(objective),
            message: "Feasible solution found, optimality not proven".to_string(),
        }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: None,
            objective: None,
            message: "Problem is infeasible".to_string(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            status: SolutionStatus::Timeout,
            values: None,
            objective: None,
            message: "Time limit reached without feasible solution".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SolutionStatus::Error,
            values: None,
            objective: None,
            message: message.into(),
        }
    }
}

/// A MILP backend: solves a model under the given limits.
pub trait MilpSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &Model, config: &SolverConfig) -> SolverOutput;
}

/// Backends selectable by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverBackend {
    /// Pure Rust branch and bound, always compiled in
    #[default]
    MicroLp,
    /// HiGHS, requires the `highs` cargo feature
    Highs,
}

impl SolverBackend {
    /// Instantiates the backend, or fails when it was not compiled in.
    pub fn instance(self) -> Result<Box<dyn MilpSolver>> {
        match self {
            SolverBackend::MicroLp => Ok(Box::new(MicroLpSolver)),
            #[cfg(feature = "highs")]
            SolverBackend::Highs => Ok(Box::new(HighsSolver)),
            #[cfg(not(feature = "highs"))]
            SolverBackend::Highs => Err(PackingError::SolverUnavailable(
                "the highs backend requires building with the `highs` feature".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MicroLp => write!(f, "microlp"),
            Self::Highs => write!(f, "highs"),
        }
    }
}

impl std::str::FromStr for SolverBackend {
    type Err = PackingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "microlp" => Ok(Self::MicroLp),
            "highs" => Ok(Self::Highs),
            other => Err(PackingError::SolverUnavailable(format!(
                "unknown backend '{}'",
                other
            ))),
        }
    }
}
