use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::solver::SolverBackend;

/// Item to be packed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: String,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Whether the item may be turned by 90 degrees
    #[serde(default)]
    pub can_rotate: bool,
}

impl Item {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            id: String::new(),
            width,
            height,
            quantity: 1,
            can_rotate: false,
        }
    }

    pub fn rotatable(mut self) -> Self {
        self.can_rotate = true;
        self
    }
}

fn default_quantity() -> u32 {
    1
}

/// Bin type - describes an available bin size and what one bin costs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinType {
    #[serde(default)]
    pub id: String,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_bin_cost")]
    pub cost: f64,
}

impl BinType {
    pub fn new(width: f64, height: f64, cost: f64) -> Self {
        Self {
            id: String::new(),
            width,
            height,
            cost,
        }
    }
}

fn default_bin_cost() -> f64 {
    1.0
}

/// Cost terms that shape the objective beyond the plain bin cost.
///
/// Leftover costs are paid per unit of unused margin and are normally negative,
/// i.e. a bonus for leaving one large strip free instead of scattering space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    /// Cost per unit of leftover width, one entry per bin type.
    /// Defaults to `-0.5 * cost / width`.
    #[serde(default)]
    pub leftover_width_cost: Option<Vec<f64>>,
    /// Cost per unit of leftover height, one entry per bin type.
    /// Defaults to `-0.5 * cost / height`.
    #[serde(default)]
    pub leftover_height_cost: Option<Vec<f64>>,
    /// Add the largest leftover over all used bins to the objective
    #[serde(default = "default_true")]
    pub global_leftover: bool,
    /// Defaults to `0.0`
    #[serde(default)]
    pub global_leftover_width_cost: Option<f64>,
    /// Defaults to `-0.1 * min(cost) / max(height)`
    #[serde(default)]
    pub global_leftover_height_cost: Option<f64>,
    /// Restrict equivalent bin copies so the solver does not revisit mirrored solutions
    #[serde(default = "default_true")]
    pub symmetry_breaking: bool,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            leftover_width_cost: None,
            leftover_height_cost: None,
            global_leftover: true,
            global_leftover_width_cost: None,
            global_leftover_height_cost: None,
            symmetry_breaking: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Options handed through to the MILP backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall clock budget in seconds
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// Relative optimality gap at which the backend may stop
    #[serde(default = "default_mip_gap")]
    pub mip_gap: f64,
    #[serde(default)]
    pub backend: SolverBackend,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: default_time_limit(),
            mip_gap: default_mip_gap(),
            backend: SolverBackend::default(),
        }
    }
}

fn default_time_limit() -> f64 {
    20.0
}

fn default_mip_gap() -> f64 {
    0.001
}

/// Input: What user provides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingRequest {
    pub items: Vec<Item>,
    pub bin_types: Vec<BinType>,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// An item as placed inside a bin. Width and height are the placed extents,
/// already swapped when the item was rotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedItem {
    /// Index into the expanded item list
    pub index: usize,
    pub item_id: String,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

/// A used bin and its contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedBin {
    /// Index of the originating bin type
    pub bin_type: usize,
    pub bin_type_id: String,
    pub width: f64,
    pub height: f64,
    pub cost: f64,
    pub items: Vec<PackedItem>,
}

/// Output: What the packer returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingResult {
    /// Used bins in slot order
    pub bins: Vec<PackedBin>,
    /// Sum of the cost of all used bins. Leftover terms are not included.
    pub total_cost: f64,
    /// Objective value of the solved model, leftover terms included
    pub objective: f64,
    pub status: SolutionStatus,
    /// How many bins of each type are needed
    pub bins_required: BTreeMap<String, u32>,
}

impl PackingResult {
    pub fn empty() -> Self {
        Self {
            bins: Vec::new(),
            total_cost: 0.0,
            objective: 0.0,
            status: SolutionStatus::Optimal,
            bins_required: BTreeMap::new(),
        }
    }

    /// True when the backend stopped before proving optimality.
    pub fn may_be_suboptimal(&self) -> bool {
        self.status == SolutionStatus::Feasible
    }
}

/// Outcome reported by a MILP backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    /// Proven optimal solution found
    Optimal,
    /// Feasible solution found, optimality not proven (time limit or gap)
    Feasible,
    /// No packing exists
    Infeasible,
    /// Time limit reached without any feasible solution
    Timeout,
    /// Backend failure
    Error,
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Feasible => write!(f, "feasible"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Timeout => write!(f, "timeout"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Error type for packing
#[derive(Debug, thiserror::Error)]
pub enum PackingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("No feasible packing exists")]
    Infeasible,

    #[error("Time limit exceeded before a feasible packing was found")]
    TimeLimitExceeded,

    #[error("Malformed solution: {0}")]
    MalformedSolution(String),

    #[error("Solver error: {0}")]
    Solver(String),
}

pub type Result<T> = std::result::Result<T, PackingError>;
