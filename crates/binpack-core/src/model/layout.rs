use super::VarId;

/// Position of every variable family in the flat variable vector.
///
/// Families are laid out in declaration order:
/// `l`, `b` (n x n), `f` (n x slots), `z`, `x`, `y`, `r`, `lw`, `lh`,
/// then `mlw`, `mlh`, `maxlw`, `maxlh` when the global leftover term is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLayout {
    items: usize,
    slots: usize,
    global_leftover: bool,
}

impl VarLayout {
    pub fn new(items: usize, slots: usize, global_leftover: bool) -> Self {
        Self {
            items,
            slots,
            global_leftover,
        }
    }

    pub fn num_items(&self) -> usize {
        self.items
    }

    pub fn num_slots(&self) -> usize {
        self.slots
    }

    pub fn has_global_leftover(&self) -> bool {
        self.global_leftover
    }

    pub fn len(&self) -> usize {
        let base = 2 * self.items * self.items
            + self.items * self.slots
            + self.slots
            + 3 * self.items
            + 2 * self.slots;
        if self.global_leftover {
            base + 2 * self.slots + 2
        } else {
            base
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn l_base(&self) -> usize {
        0
    }

    fn b_base(&self) -> usize {
        self.items * self.items
    }

    fn f_base(&self) -> usize {
        2 * self.items * self.items
    }

    fn z_base(&self) -> usize {
        self.f_base() + self.items * self.slots
    }

    fn x_base(&self) -> usize {
        self.z_base() + self.slots
    }

    fn y_base(&self) -> usize {
        self.x_base() + self.items
    }

    fn r_base(&self) -> usize {
        self.y_base() + self.items
    }

    fn lw_base(&self) -> usize {
        self.r_base() + self.items
    }

    fn lh_base(&self) -> usize {
        self.lw_base() + self.slots
    }

    fn mlw_base(&self) -> usize {
        self.lh_base() + self.slots
    }

    fn mlh_base(&self) -> usize {
        self.mlw_base() + self.slots
    }

    /// Item `i` lies left of item `j`
    pub fn l(&self, i: usize, j: usize) -> VarId {
        debug_assert!(i < self.items && j < self.items);
        VarId(self.l_base() + i * self.items + j)
    }

    /// Item `i` lies below item `j`
    pub fn b(&self, i: usize, j: usize) -> VarId {
        debug_assert!(i < self.items && j < self.items);
        VarId(self.b_base() + i * self.items + j)
    }

    /// Item `i` occupies slot `k`
    pub fn f(&self, i: usize, k: usize) -> VarId {
        debug_assert!(i < self.items && k < self.slots);
        VarId(self.f_base() + i * self.slots + k)
    }

    /// Slot `k` is used
    pub fn z(&self, k: usize) -> VarId {
        debug_assert!(k < self.slots);
        VarId(self.z_base() + k)
    }

    pub fn x(&self, i: usize) -> VarId {
        debug_assert!(i < self.items);
        VarId(self.x_base() + i)
    }

    pub fn y(&self, i: usize) -> VarId {
        debug_assert!(i < self.items);
        VarId(self.y_base() + i)
    }

    /// Item `i` is rotated by 90 degrees
    pub fn r(&self, i: usize) -> VarId {
        debug_assert!(i < self.items);
        VarId(self.r_base() + i)
    }

    /// Leftover width of slot `k`
    pub fn lw(&self, k: usize) -> VarId {
        debug_assert!(k < self.slots);
        VarId(self.lw_base() + k)
    }

    /// Leftover height of slot `k`
    pub fn lh(&self, k: usize) -> VarId {
        debug_assert!(k < self.slots);
        VarId(self.lh_base() + k)
    }

    /// Slot `k` realises the largest leftover width
    pub fn mlw(&self, k: usize) -> Option<VarId> {
        debug_assert!(k < self.slots);
        self.global_leftover.then(|| VarId(self.mlw_base() + k))
    }

    /// Slot `k` realises the largest leftover height
    pub fn mlh(&self, k: usize) -> Option<VarId> {
        debug_assert!(k < self.slots);
        self.global_leftover.then(|| VarId(self.mlh_base() + k))
    }

    pub fn maxlw(&self) -> Option<VarId> {
        self.global_leftover
            .then(|| VarId(self.mlh_base() + self.slots))
    }

    pub fn maxlh(&self) -> Option<VarId> {
        self.global_leftover
            .then(|| VarId(self.mlh_base() + self.slots + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families_are_dense_and_disjoint() {
        let layout = VarLayout::new(3, 6, true);
        let mut ids = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                ids.push(layout.l(i, j));
                ids.push(layout.b(i, j));
            }
            for k in 0..6 {
                ids.push(layout.f(i, k));
            }
            ids.push(layout.x(i));
            ids.push(layout.y(i));
            ids.push(layout.r(i));
        }
        for k in 0..6 {
            ids.push(layout.z(k));
            ids.push(layout.lw(k));
            ids.push(layout.lh(k));
            ids.push(layout.mlw(k).unwrap());
            ids.push(layout.mlh(k).unwrap());
        }
        ids.push(layout.maxlw().unwrap());
        ids.push(layout.maxlh().unwrap());

        ids.sort();
        let expected: Vec<VarId> = (0..layout.len()).map(VarId).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_global_family_absent_when_disabled() {
        let layout = VarLayout::new(2, 2, false);
        assert!(layout.mlw(0).is_none());
        assert!(layout.maxlh().is_none());
        assert_eq!(layout.len(), 8 + 4 + 2 + 6 + 4);
    }
}
