use super::*;
use tracing::debug;

/// Expands every bin type into one slot per item, copy-major: slot `k` is
/// copy `k / m` of bin type `k % m`. No packing can use more than `n` bins of
/// a single type, so `n * m` slots never under-provision.
pub(super) fn expand_slots(problem: &PackingProblem) -> Vec<BinSlot> {
    let n = problem.num_items();
    let m = problem.num_bin_types();
    let mut slots = Vec::with_capacity(n * m);
    for copy in 0..n {
        for (t, bin) in problem.bin_types.iter().enumerate() {
            slots.push(BinSlot {
                bin_type: t,
                copy,
                width: bin.width,
                height: bin.height,
                cost: bin.cost,
                leftover_width_cost: problem.leftover_width_cost[t],
                leftover_height_cost: problem.leftover_height_cost[t],
            });
        }
    }
    slots
}

/// Accumulates variables, constraints and objective terms while a model is built.
pub(super) struct ModelBuilder<'a> {
    pub(super) problem: &'a PackingProblem,
    pub(super) layout: VarLayout,
    pub(super) slots: Vec<BinSlot>,
    pub(super) big_m: BigM,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Vec<(VarId, f64)>,
}

impl<'a> ModelBuilder<'a> {
    fn new(problem: &'a PackingProblem) -> Self {
        let slots = expand_slots(problem);
        let layout = VarLayout::new(
            problem.num_items(),
            slots.len(),
            problem.global_leftover.is_some(),
        );
        Self {
            problem,
            layout,
            slots,
            big_m: BigM::for_problem(problem),
            variables: Vec::with_capacity(layout.len()),
            constraints: Vec::new(),
            objective: Vec::new(),
        }
    }

    pub(super) fn declare(
        &mut self,
        expected: VarId,
        name: String,
        kind: VarKind,
        lower: f64,
        upper: f64,
    ) {
        debug_assert_eq!(expected.0, self.variables.len(), "{} out of order", name);
        self.variables.push(Variable {
            name,
            kind,
            lower,
            upper,
        });
    }

    pub(super) fn constrain(
        &mut self,
        name: String,
        terms: Vec<(VarId, f64)>,
        sense: Sense,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name,
            terms,
            sense,
            rhs,
        });
    }

    pub(super) fn add_cost(&mut self, var: VarId, coeff: f64) {
        if coeff != 0.0 {
            self.objective.push((var, coeff));
        }
    }

    /// Whether item `i` may be assigned to slot `k` at all. With symmetry
    /// breaking on, item `i` only sees copies `0..=i` of each bin type.
    pub(super) fn assignable(&self, i: usize, k: usize) -> bool {
        !self.problem.symmetry_breaking || self.slots[k].copy <= i
    }

    fn declare_variables(&mut self) {
        let n = self.layout.num_items();
        let s = self.layout.num_slots();
        let layout = self.layout;

        for i in 0..n {
            for j in 0..n {
                let upper = if i == j { 0.0 } else { 1.0 };
                self.declare(layout.l(i, j), format!("l_{}_{}", i, j), VarKind::Binary, 0.0, upper);
            }
        }
        for i in 0..n {
            for j in 0..n {
                let upper = if i == j { 0.0 } else { 1.0 };
                self.declare(layout.b(i, j), format!("b_{}_{}", i, j), VarKind::Binary, 0.0, upper);
            }
        }
        for i in 0..n {
            for k in 0..s {
                let upper = if self.assignable(i, k) { 1.0 } else { 0.0 };
                self.declare(layout.f(i, k), format!("f_{}_{}", i, k), VarKind::Binary, 0.0, upper);
            }
        }
        for k in 0..s {
            self.declare(layout.z(k), format!("z_{}", k), VarKind::Binary, 0.0, 1.0);
        }
        for i in 0..n {
            self.declare(
                layout.x(i),
                format!("x_{}", i),
                VarKind::Continuous,
                0.0,
                self.big_m.width,
            );
        }
        for i in 0..n {
            self.declare(
                layout.y(i),
                format!("y_{}", i),
                VarKind::Continuous,
                0.0,
                self.big_m.height,
            );
        }
        for i in 0..n {
            self.declare(layout.r(i), format!("r_{}", i), VarKind::Binary, 0.0, 1.0);
        }
        for k in 0..s {
            let width = self.slots[k].width;
            self.declare(layout.lw(k), format!("lw_{}", k), VarKind::Continuous, 0.0, width);
        }
        for k in 0..s {
            let height = self.slots[k].height;
            self.declare(layout.lh(k), format!("lh_{}", k), VarKind::Continuous, 0.0, height);
        }
        self.declare_global_leftover_variables();
    }

    /// At least one of: i left of j, j left of i, i below j, j below i,
    /// i not in k, j not in k.
    fn add_no_overlap(&mut self) {
        let n = self.layout.num_items();
        let layout = self.layout;
        for k in 0..self.layout.num_slots() {
            for j in 0..n {
                for i in 0..j {
                    if !self.assignable(i, k) || !self.assignable(j, k) {
                        continue;
                    }
                    self.constrain(
                        format!("overlap_{}_{}_{}", i, j, k),
                        vec![
                            (layout.l(i, j), 1.0),
                            (layout.l(j, i), 1.0),
                            (layout.b(i, j), 1.0),
                            (layout.b(j, i), 1.0),
                            (layout.f(i, k), -1.0),
                            (layout.f(j, k), -1.0),
                        ],
                        Sense::Ge,
                        -1.0,
                    );
                }
            }
        }
    }

    /// `l[i,j] = 1` forces `x_i + width_i <= x_j`, `b[i,j] = 1` forces
    /// `y_i + height_i <= y_j`, using the rotated extents when `r_i = 1`.
    fn add_separation(&mut self) {
        let n = self.layout.num_items();
        let layout = self.layout;
        let BigM {
            width: mw,
            height: mh,
        } = self.big_m;

        let problem = self.problem;

        for i in 0..n {
            let item = &problem.items[i];
            for j in 0..n {
                if i == j {
                    continue;
                }
                self.constrain(
                    format!("separation_width_{}_{}", i, j),
                    vec![
                        (layout.x(i), 1.0),
                        (layout.x(j), -1.0),
                        (layout.l(i, j), mw),
                        (layout.r(i), -mw),
                    ],
                    Sense::Le,
                    mw - item.width,
                );
                self.constrain(
                    format!("separation_height_{}_{}", i, j),
                    vec![
                        (layout.y(i), 1.0),
                        (layout.y(j), -1.0),
                        (layout.b(i, j), mh),
                        (layout.r(i), -mh),
                    ],
                    Sense::Le,
                    mh - item.height,
                );
                if !item.can_rotate {
                    continue;
                }
                self.constrain(
                    format!("separation_width_rotated_{}_{}", i, j),
                    vec![
                        (layout.x(i), 1.0),
                        (layout.x(j), -1.0),
                        (layout.l(i, j), mw),
                        (layout.r(i), mw),
                    ],
                    Sense::Le,
                    2.0 * mw - item.height,
                );
                self.constrain(
                    format!("separation_height_rotated_{}_{}", i, j),
                    vec![
                        (layout.y(i), 1.0),
                        (layout.y(j), -1.0),
                        (layout.b(i, j), mh),
                        (layout.r(i), mh),
                    ],
                    Sense::Le,
                    2.0 * mh - item.width,
                );
            }
        }
    }

    /// An item in slot `k` ends, together with the slot's leftover margin,
    /// inside the slot: `x_i + width_i + lw[k] <= W[k]` when `f[i,k] = 1`.
    fn add_containment(&mut self) {
        let n = self.layout.num_items();
        let layout = self.layout;
        let BigM {
            width: mw,
            height: mh,
        } = self.big_m;

        let problem = self.problem;

        for k in 0..self.layout.num_slots() {
            let slot = self.slots[k].clone();
            for i in 0..n {
                if !self.assignable(i, k) {
                    continue;
                }
                let item = &problem.items[i];
                self.constrain(
                    format!("containment_width_{}_{}", i, k),
                    vec![
                        (layout.x(i), 1.0),
                        (layout.f(i, k), mw),
                        (layout.r(i), -mw),
                        (layout.lw(k), 1.0),
                    ],
                    Sense::Le,
                    slot.width - item.width + mw,
                );
                self.constrain(
                    format!("containment_height_{}_{}", i, k),
                    vec![
                        (layout.y(i), 1.0),
                        (layout.f(i, k), mh),
                        (layout.r(i), -mh),
                        (layout.lh(k), 1.0),
                    ],
                    Sense::Le,
                    slot.height - item.height + mh,
                );
                if !item.can_rotate {
                    continue;
                }
                self.constrain(
                    format!("containment_width_rotated_{}_{}", i, k),
                    vec![
                        (layout.x(i), 1.0),
                        (layout.f(i, k), mw),
                        (layout.r(i), mw),
                        (layout.lw(k), 1.0),
                    ],
                    Sense::Le,
                    slot.width - item.height + 2.0 * mw,
                );
                self.constrain(
                    format!("containment_height_rotated_{}_{}", i, k),
                    vec![
                        (layout.y(i), 1.0),
                        (layout.f(i, k), mh),
                        (layout.r(i), mh),
                        (layout.lh(k), 1.0),
                    ],
                    Sense::Le,
                    slot.height - item.width + 2.0 * mh,
                );
            }
        }
    }

    fn add_assignment(&mut self) {
        let n = self.layout.num_items();
        let s = self.layout.num_slots();
        let layout = self.layout;

        for i in 0..n {
            let terms = (0..s)
                .filter(|&k| self.assignable(i, k))
                .map(|k| (layout.f(i, k), 1.0))
                .collect();
            self.constrain(format!("coverage_{}", i), terms, Sense::Ge, 1.0);
        }

        for k in 0..s {
            for i in 0..n {
                if !self.assignable(i, k) {
                    continue;
                }
                self.constrain(
                    format!("activation_{}_{}", i, k),
                    vec![(layout.f(i, k), 1.0), (layout.z(k), -1.0)],
                    Sense::Le,
                    0.0,
                );
            }
        }

        for i in 0..n {
            let allowed = if self.problem.items[i].can_rotate {
                1.0
            } else {
                0.0
            };
            self.constrain(
                format!("rotation_{}", i),
                vec![(layout.r(i), 1.0)],
                Sense::Le,
                allowed,
            );
        }
    }

    /// Copies of a bin type are opened in order: `z[c*m+t] >= z[(c+1)*m+t]`.
    fn add_symmetry_breaking(&mut self) {
        if !self.problem.symmetry_breaking {
            return;
        }
        let m = self.problem.num_bin_types();
        let layout = self.layout;
        for k in 0..self.layout.num_slots().saturating_sub(m) {
            self.constrain(
                format!("slot_order_{}", k),
                vec![(layout.z(k), 1.0), (layout.z(k + m), -1.0)],
                Sense::Ge,
                0.0,
            );
        }
    }

    fn add_bin_cost(&mut self) {
        for k in 0..self.layout.num_slots() {
            let cost = self.slots[k].cost;
            self.add_cost(self.layout.z(k), cost);
        }
    }

    fn finish(self) -> Model {
        Model {
            variables: self.variables,
            constraints: self.constraints,
            objective: self.objective,
            layout: self.layout,
            slots: self.slots,
            items: self.problem.items.clone(),
            bin_type_ids: self
                .problem
                .bin_types
                .iter()
                .enumerate()
                .map(|(t, b)| {
                    if b.id.is_empty() {
                        t.to_string()
                    } else {
                        b.id.clone()
                    }
                })
                .collect(),
            big_m: self.big_m,
        }
    }
}

/// Translates a packing problem into a MILP whose feasible points are
/// non-overlapping packings and whose objective is the packing cost.
pub fn build_model(problem: &PackingProblem) -> Model {
    let mut builder = ModelBuilder::new(problem);

    builder.declare_variables();
    builder.add_no_overlap();
    builder.add_separation();
    builder.add_containment();
    builder.add_assignment();
    builder.add_symmetry_breaking();
    builder.add_global_leftover();
    builder.add_bin_cost();
    builder.add_leftover_cost();

    let model = builder.finish();
    debug!(
        items = problem.num_items(),
        slots = model.slots().len(),
        variables = model.num_variables(),
        binaries = model.num_binaries(),
        constraints = model.constraints().len(),
        big_m_width = model.big_m().width,
        big_m_height = model.big_m().height,
        "Built packing model"
    );
    model
}
