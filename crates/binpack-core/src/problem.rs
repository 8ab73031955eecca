//! Validated, fully resolved packing instance.
//!
//! A [`PackingProblem`] is what the model builder consumes: items are expanded
//! to unit quantity, every cost has been resolved to a number and all
//! dimensions are known to be positive and finite.

use crate::types::*;

/// A single item to place, after quantity expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitItem {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub can_rotate: bool,
}

impl UnitItem {
    /// Width and height as placed, given the rotation flag.
    pub fn extent(&self, rotated: bool) -> (f64, f64) {
        if rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Whether the item fits a `width` x `height` rectangle in a permitted orientation.
    pub fn fits(&self, width: f64, height: f64) -> bool {
        (self.width <= width && self.height <= height)
            || (self.can_rotate && self.height <= width && self.width <= height)
    }
}

/// Costs of the single largest leftover across all used bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalLeftoverCost {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct PackingProblem {
    pub items: Vec<UnitItem>,
    pub bin_types: Vec<BinType>,
    /// Per bin type
    pub leftover_width_cost: Vec<f64>,
    /// Per bin type
    pub leftover_height_cost: Vec<f64>,
    pub global_leftover: Option<GlobalLeftoverCost>,
    pub symmetry_breaking: bool,
}

impl PackingProblem {
    /// Validates item and bin descriptions and resolves all default costs.
    pub fn new(items: &[Item], bin_types: &[BinType], costs: &CostConfig) -> Result<Self> {
        if bin_types.is_empty() {
            return Err(PackingError::InvalidInput(
                "At least one bin type must be provided".to_string(),
            ));
        }

        for (t, bin) in bin_types.iter().enumerate() {
            if !is_positive(bin.width) || !is_positive(bin.height) {
                return Err(PackingError::InvalidInput(format!(
                    "Bin type {} ('{}') must have positive width and height",
                    t, bin.id
                )));
            }
            if !bin.cost.is_finite() {
                return Err(PackingError::InvalidInput(format!(
                    "Bin type {} ('{}') has a non-finite cost",
                    t, bin.id
                )));
            }
        }

        for (i, item) in items.iter().enumerate() {
            if !is_positive(item.width) || !is_positive(item.height) {
                return Err(PackingError::InvalidInput(format!(
                    "Item {} ('{}') must have positive width and height",
                    i, item.id
                )));
            }
            if item.quantity == 0 {
                return Err(PackingError::InvalidInput(format!(
                    "Item {} ('{}') has zero quantity",
                    i, item.id
                )));
            }
        }

        let leftover_width_cost = resolve_per_bin(
            "leftover_width_cost",
            costs.leftover_width_cost.as_deref(),
            bin_types,
            |bin| -0.5 * bin.cost / bin.width,
        )?;
        let leftover_height_cost = resolve_per_bin(
            "leftover_height_cost",
            costs.leftover_height_cost.as_deref(),
            bin_types,
            |bin| -0.5 * bin.cost / bin.height,
        )?;

        let global_leftover = if costs.global_leftover {
            let min_cost = bin_types
                .iter()
                .map(|b| b.cost)
                .fold(f64::INFINITY, f64::min);
            let max_height = bin_types.iter().map(|b| b.height).fold(0.0, f64::max);
            let width = costs.global_leftover_width_cost.unwrap_or(0.0);
            let height = costs
                .global_leftover_height_cost
                .unwrap_or(-0.1 * min_cost / max_height);
            if !width.is_finite() || !height.is_finite() {
                return Err(PackingError::InvalidInput(
                    "Global leftover costs must be finite".to_string(),
                ));
            }
            Some(GlobalLeftoverCost { width, height })
        } else {
            None
        };

        Ok(Self {
            items: expand_items(items),
            bin_types: bin_types.to_vec(),
            leftover_width_cost,
            leftover_height_cost,
            global_leftover,
            symmetry_breaking: costs.symmetry_breaking,
        })
    }

    /// Builds a problem from parallel arrays, the way callers holding plain
    /// columns of numbers describe an instance.
    ///
    /// `bin_cost` defaults to 1 for every bin type and `allow_rotation` to
    /// `false` for every item.
    pub fn from_arrays(
        item_width: &[f64],
        item_height: &[f64],
        bin_width: &[f64],
        bin_height: &[f64],
        bin_cost: Option<&[f64]>,
        allow_rotation: Option<&[bool]>,
        costs: &CostConfig,
    ) -> Result<Self> {
        check_len("item_height", item_height.len(), item_width.len())?;
        check_len("bin_height", bin_height.len(), bin_width.len())?;
        if let Some(bin_cost) = bin_cost {
            check_len("bin_cost", bin_cost.len(), bin_width.len())?;
        }
        if let Some(allow_rotation) = allow_rotation {
            check_len("allow_rotation", allow_rotation.len(), item_width.len())?;
        }

        let items: Vec<Item> = item_width
            .iter()
            .zip(item_height)
            .enumerate()
            .map(|(i, (&width, &height))| Item {
                id: i.to_string(),
                width,
                height,
                quantity: 1,
                can_rotate: allow_rotation.map_or(false, |r| r[i]),
            })
            .collect();

        let bin_types: Vec<BinType> = bin_width
            .iter()
            .zip(bin_height)
            .enumerate()
            .map(|(t, (&width, &height))| BinType {
                id: t.to_string(),
                width,
                height,
                cost: bin_cost.map_or(1.0, |c| c[t]),
            })
            .collect();

        Self::new(&items, &bin_types, costs)
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn num_bin_types(&self) -> usize {
        self.bin_types.len()
    }

    /// First item that fits no bin type in any permitted orientation.
    pub fn unplaceable_item(&self) -> Option<usize> {
        self.items.iter().position(|item| {
            !self
                .bin_types
                .iter()
                .any(|bin| item.fits(bin.width, bin.height))
        })
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_len(name: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(PackingError::InvalidInput(format!(
            "'{}' has {} entries, expected {}",
            name, actual, expected
        )));
    }
    Ok(())
}

fn resolve_per_bin(
    name: &str,
    given: Option<&[f64]>,
    bin_types: &[BinType],
    default: impl Fn(&BinType) -> f64,
) -> Result<Vec<f64>> {
    match given {
        Some(values) => {
            check_len(name, values.len(), bin_types.len())?;
            if values.iter().any(|v| !v.is_finite()) {
                return Err(PackingError::InvalidInput(format!(
                    "'{}' contains a non-finite value",
                    name
                )));
            }
            Ok(values.to_vec())
        }
        None => Ok(bin_types.iter().map(default).collect()),
    }
}

/// Duplicates items according to their requested quantity.
fn expand_items(items: &[Item]) -> Vec<UnitItem> {
    let mut expanded = Vec::new();
    for item in items {
        for k in 0..item.quantity {
            expanded.push(UnitItem {
                id: if item.quantity > 1 {
                    format!("{}_{}", item.id, k + 1)
                } else {
                    item.id.clone()
                },
                width: item.width,
                height: item.height,
                can_rotate: item.can_rotate,
            });
        }
    }
    expanded
}
