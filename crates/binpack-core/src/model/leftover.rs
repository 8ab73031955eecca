//! Leftover accounting.
//!
//! Leftover is a one-dimensional margin per slot and direction: `lw[k]` is
//! bounded by `W[k] - (x_i + width_i)` for every item in slot `k` through the
//! containment constraints, so it measures the free strip to the right of the
//! rightmost item edge, not the unused area. The slot terms are priced per
//! bin type; the optional global term prices the single largest margin over
//! all used slots, picked by the selectors `mlw[k]` / `mlh[k]`.

use super::builder::ModelBuilder;
use super::*;

impl ModelBuilder<'_> {
    pub(super) fn declare_global_leftover_variables(&mut self) {
        let layout = self.layout;
        let (Some(maxlw), Some(maxlh)) = (layout.maxlw(), layout.maxlh()) else {
            return;
        };
        let (max_width, max_height) = self.max_slot_extent();

        for k in 0..layout.num_slots() {
            if let Some(mlw) = layout.mlw(k) {
                self.declare(mlw, format!("mlw_{}", k), VarKind::Binary, 0.0, 1.0);
            }
        }
        for k in 0..layout.num_slots() {
            if let Some(mlh) = layout.mlh(k) {
                self.declare(mlh, format!("mlh_{}", k), VarKind::Binary, 0.0, 1.0);
            }
        }
        self.declare(maxlw, "maxlw".to_string(), VarKind::Continuous, 0.0, max_width);
        self.declare(maxlh, "maxlh".to_string(), VarKind::Continuous, 0.0, max_height);
    }

    /// `maxlw <= lw[k] + (1 - mlw[k]) * max(W)`, exactly one selector set and
    /// only on used slots. Same for heights.
    pub(super) fn add_global_leftover(&mut self) {
        let layout = self.layout;
        let (Some(maxlw), Some(maxlh)) = (layout.maxlw(), layout.maxlh()) else {
            return;
        };
        let s = layout.num_slots();
        if s == 0 {
            // No slot can carry the selector; the maxima stay at zero.
            return;
        }
        let (max_width, max_height) = self.max_slot_extent();

        let mut width_selectors = Vec::with_capacity(s);
        let mut height_selectors = Vec::with_capacity(s);

        for k in 0..s {
            let (Some(mlw), Some(mlh)) = (layout.mlw(k), layout.mlh(k)) else {
                continue;
            };
            self.constrain(
                format!("max_leftover_width_{}", k),
                vec![(maxlw, 1.0), (layout.lw(k), -1.0), (mlw, max_width)],
                Sense::Le,
                max_width,
            );
            self.constrain(
                format!("max_leftover_height_{}", k),
                vec![(maxlh, 1.0), (layout.lh(k), -1.0), (mlh, max_height)],
                Sense::Le,
                max_height,
            );
            self.constrain(
                format!("max_leftover_width_used_{}", k),
                vec![(mlw, 1.0), (layout.z(k), -1.0)],
                Sense::Le,
                0.0,
            );
            self.constrain(
                format!("max_leftover_height_used_{}", k),
                vec![(mlh, 1.0), (layout.z(k), -1.0)],
                Sense::Le,
                0.0,
            );
            width_selectors.push((mlw, 1.0));
            height_selectors.push((mlh, 1.0));
        }

        self.constrain(
            "max_leftover_width_select".to_string(),
            width_selectors,
            Sense::Eq,
            1.0,
        );
        self.constrain(
            "max_leftover_height_select".to_string(),
            height_selectors,
            Sense::Eq,
            1.0,
        );
    }

    pub(super) fn add_leftover_cost(&mut self) {
        let layout = self.layout;
        for k in 0..layout.num_slots() {
            let slot = &self.slots[k];
            let (width_cost, height_cost) = (slot.leftover_width_cost, slot.leftover_height_cost);
            self.add_cost(layout.lw(k), width_cost);
            self.add_cost(layout.lh(k), height_cost);
        }

        if let (Some(global), Some(maxlw), Some(maxlh)) = (
            self.problem.global_leftover,
            layout.maxlw(),
            layout.maxlh(),
        ) {
            self.add_cost(maxlw, global.width);
            self.add_cost(maxlh, global.height);
        }
    }

    fn max_slot_extent(&self) -> (f64, f64) {
        let width = self.slots.iter().map(|s| s.width).fold(0.0, f64::max);
        let height = self.slots.iter().map(|s| s.height).fold(0.0, f64::max);
        (width, height)
    }
}
