//! Turns a solver's flat variable assignment back into bins and placements.

use crate::model::Model;
use crate::types::*;

/// Binary variables are read by rounding to the nearest integer, so solver
/// noise such as `0.999999` or `1e-9` is absorbed.
pub const BINARY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPacking {
    pub bins: Vec<PackedBin>,
    /// Cost of the used bins only
    pub total_cost: f64,
}

fn is_set(value: f64) -> bool {
    value > BINARY_THRESHOLD
}

/// Decodes an assignment for every variable of `model`.
///
/// Used bins are reported in slot order and items by index. An item is
/// reported in the first used slot it is assigned to, so it appears exactly
/// once even if the assignment marks it in several slots. The assignment is
/// trusted to satisfy the model's constraints.
pub fn decode(model: &Model, values: &[f64]) -> Result<DecodedPacking> {
    if values.len() != model.num_variables() {
        return Err(PackingError::MalformedSolution(format!(
            "expected {} values, got {}",
            model.num_variables(),
            values.len()
        )));
    }

    let layout = model.layout();
    let value = |var: crate::model::VarId| values[var.index()];

    let used: Vec<usize> = (0..layout.num_slots())
        .filter(|&k| is_set(value(layout.z(k))))
        .collect();

    let mut contents: Vec<Vec<PackedItem>> = vec![Vec::new(); used.len()];
    for (i, item) in model.items().iter().enumerate() {
        let position = used
            .iter()
            .position(|&k| is_set(value(layout.f(i, k))))
            .ok_or_else(|| {
                PackingError::MalformedSolution(format!("item {} is not in any used bin", i))
            })?;

        let rotated = is_set(value(layout.r(i)));
        let (width, height) = item.extent(rotated);
        contents[position].push(PackedItem {
            index: i,
            item_id: if item.id.is_empty() {
                i.to_string()
            } else {
                item.id.clone()
            },
            width,
            height,
            x: value(layout.x(i)).max(0.0),
            y: value(layout.y(i)).max(0.0),
            rotated,
        });
    }

    let mut total_cost = 0.0;
    let bins = used
        .iter()
        .zip(contents)
        .map(|(&k, items)| {
            let slot = &model.slots()[k];
            total_cost += slot.cost;
            PackedBin {
                bin_type: slot.bin_type,
                bin_type_id: model.bin_type_id(slot.bin_type).to_string(),
                width: slot.width,
                height: slot.height,
                cost: slot.cost,
                items,
            }
        })
        .collect();

    Ok(DecodedPacking { bins, total_cost })
}
