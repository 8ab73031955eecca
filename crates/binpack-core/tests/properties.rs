use binpack_core::decoder::decode;
use binpack_core::model::{build_model, Model};
use binpack_core::*;
use proptest::prelude::*;

fn dimension() -> impl Strategy<Value = f64> {
    (1u32..=50).prop_map(f64::from)
}

fn item() -> impl Strategy<Value = Item> {
    (dimension(), dimension(), any::<bool>()).prop_map(|(width, height, can_rotate)| Item {
        can_rotate,
        ..Item::new(width, height)
    })
}

fn bin_type() -> impl Strategy<Value = BinType> {
    (dimension(), dimension(), 1u32..=20)
        .prop_map(|(width, height, cost)| BinType::new(width, height, f64::from(cost)))
}

/// First bin type that takes the item, and whether it has to be turned.
fn first_fit(item: &Item, bins: &[BinType]) -> Option<(usize, bool)> {
    bins.iter().enumerate().find_map(|(t, bin)| {
        if item.width <= bin.width && item.height <= bin.height {
            Some((t, false))
        } else if item.can_rotate && item.height <= bin.width && item.width <= bin.height {
            Some((t, true))
        } else {
            None
        }
    })
}

/// Puts item `i` alone at the origin of copy `i` of its first fitting type.
fn one_item_per_bin(model: &Model, choice: &[(usize, bool)]) -> Vec<f64> {
    let layout = model.layout();
    let m = model.slots().len() / choice.len();
    let mut values = vec![0.0; model.num_variables()];

    for (k, slot) in model.slots().iter().enumerate() {
        values[layout.lw(k).index()] = slot.width;
        values[layout.lh(k).index()] = slot.height;
    }

    for (i, &(t, rotated)) in choice.iter().enumerate() {
        let k = i * m + t;
        let (width, height) = model.items()[i].extent(rotated);
        let slot = &model.slots()[k];
        values[layout.z(k).index()] = 1.0;
        values[layout.f(i, k).index()] = 1.0;
        values[layout.r(i).index()] = if rotated { 1.0 } else { 0.0 };
        values[layout.lw(k).index()] = slot.width - width;
        values[layout.lh(k).index()] = slot.height - height;
    }

    let first = choice[0].0;
    values[layout.mlw(first).unwrap().index()] = 1.0;
    values[layout.mlh(first).unwrap().index()] = 1.0;
    values
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_separate_bins_satisfy_model(
        items in prop::collection::vec(item(), 1..5),
        bins in prop::collection::vec(bin_type(), 1..3),
    ) {
        let choice: Option<Vec<(usize, bool)>> = items.iter().map(|i| first_fit(i, &bins)).collect();
        prop_assume!(choice.is_some());
        let choice = choice.unwrap();

        let costs = CostConfig { symmetry_breaking: false, ..CostConfig::default() };
        let problem = PackingProblem::new(&items, &bins, &costs).unwrap();
        let model = build_model(&problem);
        prop_assert_eq!(model.num_variables(), model.layout().len());

        let values = one_item_per_bin(&model, &choice);
        let violations = model.violations(&values, 1e-6);
        prop_assert!(violations.is_empty(), "{:?}", violations);

        let decoded = decode(&model, &values).unwrap();
        prop_assert_eq!(decoded.bins.len(), items.len());
        let expected: f64 = choice.iter().map(|&(t, _)| bins[t].cost).sum();
        prop_assert!((decoded.total_cost - expected).abs() < 1e-9);

        for bin in &decoded.bins {
            prop_assert_eq!(bin.items.len(), 1);
            let placed = &bin.items[0];
            prop_assert!(placed.width <= bin.width && placed.height <= bin.height);
            prop_assert!(!placed.rotated || items[placed.index].can_rotate);
        }
    }

    #[test]
    fn prop_constraints_reference_declared_variables(
        items in prop::collection::vec(item(), 0..4),
        bins in prop::collection::vec(bin_type(), 1..3),
        symmetry_breaking in any::<bool>(),
        global_leftover in any::<bool>(),
    ) {
        let costs = CostConfig { symmetry_breaking, global_leftover, ..CostConfig::default() };
        let problem = PackingProblem::new(&items, &bins, &costs).unwrap();
        let model = build_model(&problem);

        prop_assert_eq!(model.slots().len(), items.len() * bins.len());
        for constraint in model.constraints() {
            for &(var, coeff) in &constraint.terms {
                prop_assert!(var.index() < model.num_variables());
                prop_assert!(coeff.is_finite());
            }
        }
        let rotated = model.constraints_named("separation_width_rotated_").count();
        let turnable = items.iter().filter(|i| i.can_rotate).count();
        prop_assert_eq!(rotated, turnable * items.len().saturating_sub(1));
    }

    #[test]
    fn prop_decoding_twice_is_stable(
        items in prop::collection::vec(item(), 1..4),
        bins in prop::collection::vec(bin_type(), 1..3),
    ) {
        let choice: Option<Vec<(usize, bool)>> = items.iter().map(|i| first_fit(i, &bins)).collect();
        prop_assume!(choice.is_some());
        let choice = choice.unwrap();

        let costs = CostConfig { symmetry_breaking: false, ..CostConfig::default() };
        let model = build_model(&PackingProblem::new(&items, &bins, &costs).unwrap());
        let values = one_item_per_bin(&model, &choice);

        prop_assert_eq!(decode(&model, &values).unwrap(), decode(&model, &values).unwrap());
    }
}
