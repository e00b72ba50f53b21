//! # BOM Resolver
//!
//! Expands a product's recipe into per-component quantities.
//!
//! ## Scaling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Recipe "Dough": output 1 kg, uses 0.6 kg Flour                         │
//! │  Product "Loaf": box net weight 2 kg                                    │
//! │                                                                         │
//! │  qty_per_box = item.weight × box_net_weight / recipe.output_weight      │
//! │              = 0.6 × 2 / 1 = 1.2 kg Flour                               │
//! │  total       = qty_per_box × boxes                                      │
//! │              = 1.2 × 10 = 12 kg Flour                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Units are taken at face value. A recipe item in grams against a component
//! stocked in kilograms is NOT converted; keeping units consistent is the
//! catalog's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Product, Recipe};

/// Component id → required quantity, ordered by component id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements(BTreeMap<String, Decimal>);

impl Requirements {
    pub fn new() -> Self {
        Requirements(BTreeMap::new())
    }

    /// Adds `qty` to the requirement for `component_id`.
    ///
    /// Fails with `Validation(Overflow)` when the sum leaves the decimal range.
    pub fn add(&mut self, component_id: impl Into<String>, qty: Decimal) -> CoreResult<()> {
        let component_id = component_id.into();
        let current = self.0.get(&component_id).copied().unwrap_or(Decimal::ZERO);
        let total = current
            .checked_add(qty)
            .ok_or_else(|| overflow(&component_id))?;
        self.0.insert(component_id, total);
        Ok(())
    }

    /// Sums another set of requirements into this one.
    pub fn merge(&mut self, other: Requirements) -> CoreResult<()> {
        for (component_id, qty) in other.0 {
            self.add(component_id, qty)?;
        }
        Ok(())
    }

    pub fn get(&self, component_id: &str) -> Option<Decimal> {
        self.0.get(component_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.0.iter()
    }

    pub fn component_ids(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Requirements {
    type Item = (String, Decimal);
    type IntoIter = std::collections::btree_map::IntoIter<String, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Checks that a recipe can be expanded.
///
/// ## Errors
/// `InvalidRecipe` when the output weight is not positive, the recipe has
/// no items, or an item weight is negative.
pub fn validate_recipe(recipe: &Recipe) -> CoreResult<()> {
    if recipe.output_weight <= Decimal::ZERO {
        return Err(CoreError::invalid_recipe(
            &recipe.id,
            format!("output weight must be positive, got {}", recipe.output_weight),
        ));
    }

    if recipe.items.is_empty() {
        return Err(CoreError::invalid_recipe(&recipe.id, "recipe has no items"));
    }

    if let Some(item) = recipe.items.iter().find(|i| i.weight < Decimal::ZERO) {
        return Err(CoreError::invalid_recipe(
            &recipe.id,
            format!("item for component {} has negative weight", item.component_id),
        ));
    }

    Ok(())
}

/// Quantity of each component needed for one box of `product`.
pub fn per_box(product: &Product, recipe: &Recipe) -> CoreResult<Requirements> {
    if product.recipe_id != recipe.id {
        return Err(CoreError::invalid_recipe(
            &recipe.id,
            format!("recipe is not used by product {}", product.id),
        ));
    }
    validate_recipe(recipe)?;

    let mut requirements = Requirements::new();
    for item in &recipe.items {
        let qty = item
            .weight
            .checked_mul(product.box_net_weight)
            .and_then(|scaled| scaled.checked_div(recipe.output_weight))
            .ok_or_else(|| overflow(&item.component_id))?;
        if qty > Decimal::ZERO {
            requirements.add(item.component_id.clone(), qty)?;
        }
    }
    Ok(requirements)
}

/// Quantity of each component needed for `boxes` boxes of `product`.
///
/// ## Errors
/// - `Validation` when `boxes <= 0`
/// - `InvalidRecipe` (see [`validate_recipe`])
pub fn requirements_for(product: &Product, recipe: &Recipe, boxes: i64) -> CoreResult<Requirements> {
    if boxes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "boxes".to_string(),
        }
        .into());
    }

    let boxes = Decimal::from(boxes);
    let per_box = per_box(product, recipe)?;

    let mut requirements = Requirements::new();
    for (component_id, qty) in per_box {
        let total = qty
            .checked_mul(boxes)
            .ok_or_else(|| overflow(&component_id))?;
        requirements.add(component_id, total)?;
    }
    Ok(requirements)
}

fn overflow(component_id: &str) -> CoreError {
    ValidationError::Overflow {
        field: format!("requirement for component {component_id}"),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::RecipeItem;
    use chrono::Utc;
    use proptest::prelude::*;

    fn item(component_id: &str, weight: Decimal) -> RecipeItem {
        RecipeItem {
            id: format!("ri-{component_id}"),
            recipe_id: "r-dough".to_string(),
            component_id: component_id.to_string(),
            weight,
            unit: "kg".to_string(),
        }
    }

    fn dough(output_weight: Decimal, items: Vec<RecipeItem>) -> Recipe {
        Recipe {
            id: "r-dough".to_string(),
            name: "Dough".to_string(),
            output_weight,
            output_unit: "kg".to_string(),
            items,
            created_at: Utc::now(),
        }
    }

    fn loaf(box_net_weight: Decimal) -> Product {
        let now = Utc::now();
        Product {
            id: "p-loaf".to_string(),
            name: "Loaf".to_string(),
            code: "LOAF".to_string(),
            recipe_id: "r-dough".to_string(),
            box_gross_weight: box_net_weight + Decimal::new(2, 1),
            box_net_weight,
            base_price: Money::from_units(100),
            retail1_price: Money::from_units(140),
            retail2_price: Money::from_units(170),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_loaf_needs_twelve_kg_flour_for_ten_boxes() {
        let recipe = dough(Decimal::ONE, vec![item("flour", Decimal::new(6, 1))]);
        let product = loaf(Decimal::from(2));

        let per_box = per_box(&product, &recipe).unwrap();
        assert_eq!(per_box.get("flour"), Some(Decimal::new(12, 1)));

        let req = requirements_for(&product, &recipe, 10).unwrap();
        assert_eq!(req.get("flour"), Some(Decimal::from(12)));
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn test_scales_by_output_weight() {
        // A 5 kg batch using 3 kg flour and 0.5 kg sugar, packed 2 kg per box
        let recipe = dough(
            Decimal::from(5),
            vec![item("flour", Decimal::from(3)), item("sugar", Decimal::new(5, 1))],
        );
        let req = requirements_for(&loaf(Decimal::from(2)), &recipe, 5).unwrap();

        assert_eq!(req.get("flour"), Some(Decimal::from(6)));
        assert_eq!(req.get("sugar"), Some(Decimal::ONE));
    }

    #[test]
    fn test_duplicate_items_are_summed() {
        let recipe = dough(
            Decimal::ONE,
            vec![item("flour", Decimal::new(4, 1)), item("flour", Decimal::new(2, 1))],
        );
        let req = requirements_for(&loaf(Decimal::ONE), &recipe, 1).unwrap();
        assert_eq!(req.get("flour"), Some(Decimal::new(6, 1)));
    }

    #[test]
    fn test_zero_weight_items_are_skipped() {
        let recipe = dough(
            Decimal::ONE,
            vec![item("flour", Decimal::ONE), item("salt", Decimal::ZERO)],
        );
        let req = requirements_for(&loaf(Decimal::ONE), &recipe, 3).unwrap();
        assert_eq!(req.get("salt"), None);
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn test_zero_output_weight_is_invalid_recipe() {
        let recipe = dough(Decimal::ZERO, vec![item("flour", Decimal::ONE)]);
        let err = requirements_for(&loaf(Decimal::ONE), &recipe, 1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecipe { ref recipe_id, .. } if recipe_id == "r-dough"));

        let recipe = dough(Decimal::from(-1), vec![item("flour", Decimal::ONE)]);
        assert!(matches!(
            requirements_for(&loaf(Decimal::ONE), &recipe, 1),
            Err(CoreError::InvalidRecipe { .. })
        ));
    }

    #[test]
    fn test_empty_recipe_is_invalid() {
        let recipe = dough(Decimal::ONE, vec![]);
        assert!(matches!(
            requirements_for(&loaf(Decimal::ONE), &recipe, 1),
            Err(CoreError::InvalidRecipe { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_boxes() {
        let recipe = dough(Decimal::ONE, vec![item("flour", Decimal::ONE)]);
        assert!(matches!(
            requirements_for(&loaf(Decimal::ONE), &recipe, 0),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_merge_sums_shared_components() {
        let mut a = Requirements::new();
        a.add("flour", Decimal::from(12)).unwrap();
        a.add("sugar", Decimal::ONE).unwrap();

        let mut b = Requirements::new();
        b.add("flour", Decimal::from(3)).unwrap();
        b.add("butter", Decimal::from(2)).unwrap();

        a.merge(b).unwrap();
        assert_eq!(a.get("flour"), Some(Decimal::from(15)));
        assert_eq!(a.get("sugar"), Some(Decimal::ONE));
        assert_eq!(a.get("butter"), Some(Decimal::from(2)));
        assert_eq!(
            a.component_ids().cloned().collect::<Vec<_>>(),
            vec!["butter", "flour", "sugar"]
        );
    }

    #[test]
    fn test_sum_beyond_decimal_range_is_an_error() {
        let mut req = Requirements::new();
        req.add("flour", Decimal::MAX).unwrap();
        assert!(matches!(
            req.add("flour", Decimal::ONE),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
        assert_eq!(req.get("flour"), Some(Decimal::MAX));
    }

    #[test]
    fn test_tiny_output_weight_overflows_instead_of_panicking() {
        let recipe = dough(Decimal::new(1, 28), vec![item("flour", Decimal::from(1_000_000))]);
        assert!(matches!(
            requirements_for(&loaf(Decimal::from(1_000_000)), &recipe, 1),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
    }

    proptest! {
        #[test]
        fn prop_expansion_is_linear(
            weights in prop::collection::vec(0i64..100_000, 1..6),
            net in 1i64..100_000,
            output in prop::sample::select(vec![1i64, 2, 4, 5, 8, 10, 20, 25, 50, 100]),
            boxes in 1i64..5_000,
        ) {
            let items = weights
                .iter()
                .enumerate()
                .map(|(i, w)| item(&format!("c{i}"), Decimal::new(*w, 3)))
                .collect();
            let recipe = dough(Decimal::new(output, 1), items);
            let product = loaf(Decimal::new(net, 3));

            let single = requirements_for(&product, &recipe, boxes).unwrap();
            let double = requirements_for(&product, &recipe, boxes * 2).unwrap();

            prop_assert_eq!(single.len(), double.len());
            for (component_id, qty) in single.iter() {
                prop_assert_eq!(double.get(component_id), Some(*qty * Decimal::TWO));
            }
        }
    }
}
