//! Backend-agnostic MILP representation of a packing problem.
//!
//! A [`Model`] is produced once by [`build_model`] and never mutated afterwards.
//! Variables are addressed through [`VarLayout`], which maps the indexed
//! families (`l[i,j]`, `f[i,k]`, `z[k]`, ...) to dense [`VarId`]s so that a
//! solver only ever sees a flat vector of values.

use crate::problem::{PackingProblem, UnitItem};

mod builder;
mod layout;
mod leftover;
mod lp_format;

pub use builder::build_model;
pub use layout::VarLayout;

/// Dense index of a variable inside a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// `Σ coeff * var  (<= | >= | =)  rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| coeff * values[var.0])
            .sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// One candidate bin instance. Slot `k` is copy `k / m` of bin type `k % m`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSlot {
    pub bin_type: usize,
    pub copy: usize,
    pub width: f64,
    pub height: f64,
    pub cost: f64,
    pub leftover_width_cost: f64,
    pub leftover_height_cost: f64,
}

/// Big-M constants of the relaxed conditional constraints, one per dimension.
///
/// Each value is the largest bin dimension in that direction, raised to the
/// longest side of any rotatable item when that side is longer. A per-slot
/// bound would give a tighter relaxation at the cost of more bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigM {
    pub width: f64,
    pub height: f64,
}

impl BigM {
    pub fn for_problem(problem: &PackingProblem) -> Self {
        let longest_rotatable = problem
            .items
            .iter()
            .filter(|item| item.can_rotate)
            .map(|item| item.width.max(item.height))
            .fold(0.0, f64::max);
        let max_width = problem.bin_types.iter().map(|b| b.width).fold(0.0, f64::max);
        let max_height = problem
            .bin_types
            .iter()
            .map(|b| b.height)
            .fold(0.0, f64::max);

        Self {
            width: max_width.max(longest_rotatable),
            height: max_height.max(longest_rotatable),
        }
    }
}

/// A violated bound, integrality requirement or constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone)]
pub struct Model {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Vec<(VarId, f64)>,
    layout: VarLayout,
    slots: Vec<BinSlot>,
    items: Vec<UnitItem>,
    bin_type_ids: Vec<String>,
    big_m: BigM,
}

impl Model {
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Objective terms; the model is always minimised.
    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn layout(&self) -> &VarLayout {
        &self.layout
    }

    pub fn slots(&self) -> &[BinSlot] {
        &self.slots
    }

    pub fn items(&self) -> &[UnitItem] {
        &self.items
    }

    pub fn bin_type_id(&self, bin_type: usize) -> &str {
        &self.bin_type_ids[bin_type]
    }

    pub fn big_m(&self) -> BigM {
        self.big_m
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_binaries(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    pub fn constraints_named<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Constraint> {
        self.constraints
            .iter()
            .filter(move |c| c.name.starts_with(prefix))
    }

    /// Objective value of an assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .map(|&(var, coeff)| coeff * values[var.0])
            .sum()
    }

    /// Lists everything an assignment violates. An empty list means the
    /// assignment is feasible within `tolerance`.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<Violation> {
        let mut violations = Vec::new();

        if values.len() != self.variables.len() {
            violations.push(Violation {
                name: "assignment length".to_string(),
                amount: (values.len() as f64 - self.variables.len() as f64).abs(),
            });
            return violations;
        }

        for (var, &value) in self.variables.iter().zip(values) {
            if value < var.lower - tolerance {
                violations.push(Violation {
                    name: format!("{} lower bound", var.name),
                    amount: var.lower - value,
                });
            }
            if value > var.upper + tolerance {
                violations.push(Violation {
                    name: format!("{} upper bound", var.name),
                    amount: value - var.upper,
                });
            }
            if var.kind == VarKind::Binary && (value - value.round()).abs() > tolerance {
                violations.push(Violation {
                    name: format!("{} integrality", var.name),
                    amount: (value - value.round()).abs(),
                });
            }
        }

        for constraint in &self.constraints {
            if !constraint.is_satisfied(values, tolerance) {
                violations.push(Violation {
                    name: constraint.name.clone(),
                    amount: (constraint.lhs(values) - constraint.rhs).abs(),
                });
            }
        }

        violations
    }
}
