//! # Production Fulfillment Planning
//!
//! Converts an order's box quantities into component consumption, in two
//! phases so a shortage can never leave stock half-deducted.
//!
//! ## Two-Phase Plan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Phase 1: plan (THIS MODULE, pure)                                     │
//! │    for every order item: bom::requirements_for(product, recipe, boxes) │
//! │    merge into ONE aggregate map (shared components are summed)         │
//! │    for every aggregated component: deduct against a stock SNAPSHOT     │
//! │      any shortage → InsufficientStock, no plan, nothing written        │
//! │                                                                         │
//! │  Phase 2: apply (storage layer, one transaction)                       │
//! │    write every planned stock level (compare-and-swap on version)       │
//! │    append ProductionUsage rows                                         │
//! │    order → in_production, cost_of_goods, profit                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::bom::{self, Requirements};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::{Deduction, StockLevel};
use crate::money::Money;
use crate::types::{Component, Order, OrderItem, OrderStatus, Product, ProductionUsage, Recipe, StockEntry};

/// A component together with its current ledger row.
#[derive(Debug, Clone)]
pub struct ComponentStock {
    pub component: Component,
    pub stock: StockEntry,
}

/// An order item with the catalog records needed to expand it.
#[derive(Debug, Clone, Copy)]
pub struct OrderLine<'a> {
    pub item: &'a OrderItem,
    pub product: &'a Product,
    pub recipe: &'a Recipe,
}

/// Consumption of one component, computed against a snapshot.
#[derive(Debug, Clone)]
pub struct PlannedConsumption {
    pub component: Component,
    /// Ledger row the deduction was computed from.
    pub stock_before: StockEntry,
    pub deduction: Deduction,
}

impl PlannedConsumption {
    /// Builds the audit record for this consumption.
    pub fn to_usage(&self, id: String, order_id: &str, created_at: DateTime<Utc>) -> ProductionUsage {
        ProductionUsage {
            id,
            order_id: order_id.to_string(),
            component_id: self.component.id.clone(),
            qty_used: self.deduction.qty,
            unit: self.component.unit.clone(),
            cost_per_unit: self.deduction.cost_per_unit,
            total_cost: self.deduction.total_cost,
            created_at,
        }
    }
}

/// Everything starting production will write, already validated.
#[derive(Debug, Clone)]
pub struct ProductionPlan {
    pub order_id: String,
    /// Ordered by component id.
    pub consumptions: Vec<PlannedConsumption>,
    pub cost_of_goods: Money,
    pub revenue: Money,
    pub profit: Money,
}

impl ProductionPlan {
    /// The order as it looks once the plan is applied.
    pub fn apply_to(&self, order: &Order, started_at: DateTime<Utc>) -> Order {
        Order {
            status: OrderStatus::InProduction,
            cost_of_goods: self.cost_of_goods,
            profit: self.profit,
            updated_at: started_at,
            production_started_at: Some(started_at),
            ..order.clone()
        }
    }
}

/// Fails with `InvalidState` unless the order is `draft` or `confirmed`.
pub fn ensure_can_start(order: &Order) -> CoreResult<()> {
    if !order.status.can_start_production() {
        return Err(CoreError::InvalidState {
            order_id: order.id.clone(),
            status: order.status.to_string(),
            operation: "start production".to_string(),
        });
    }
    Ok(())
}

/// Expands every line and sums requirements across the whole order.
pub fn aggregate_requirements(lines: &[OrderLine<'_>]) -> CoreResult<Requirements> {
    let mut total = Requirements::new();
    for line in lines {
        total.merge(bom::requirements_for(line.product, line.recipe, line.item.boxes)?)?;
    }
    Ok(total)
}

/// Validates every aggregated requirement against `stock` and computes the
/// deductions, without changing anything.
///
/// ## Errors
/// - `InvalidState` if the order cannot start production
/// - `NotFound` if a required component has no ledger row
/// - `InsufficientStock` for the first short component (by component id)
pub fn plan_production(
    order: &Order,
    requirements: &Requirements,
    stock: &HashMap<String, ComponentStock>,
) -> CoreResult<ProductionPlan> {
    ensure_can_start(order)?;

    let mut consumptions = Vec::with_capacity(requirements.len());
    let mut cost_of_goods = Money::zero();

    for (component_id, qty) in requirements.iter() {
        let entry = stock
            .get(component_id)
            .ok_or_else(|| CoreError::not_found("Component", component_id))?;

        let deduction = StockLevel::from(&entry.stock).deduct(&entry.component, *qty)?;
        cost_of_goods = cost_of_goods
            .checked_add(deduction.total_cost)
            .ok_or_else(|| ValidationError::Overflow {
                field: "cost of goods".to_string(),
            })?;

        consumptions.push(PlannedConsumption {
            component: entry.component.clone(),
            stock_before: entry.stock.clone(),
            deduction,
        });
    }

    Ok(ProductionPlan {
        order_id: order.id.clone(),
        consumptions,
        cost_of_goods,
        revenue: order.total_price,
        profit: order.total_price - cost_of_goods,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentKind, RecipeItem};
    use rust_decimal::Decimal;

    fn component(id: &str, name: &str) -> Component {
        Component {
            id: id.to_string(),
            name: name.to_string(),
            kind: ComponentKind::RawMaterial,
            unit: "kg".to_string(),
            current_avg_price: Money::zero(),
            created_at: Utc::now(),
        }
    }

    fn stock(id: &str, name: &str, qty: i64, avg: i64) -> (String, ComponentStock) {
        (
            id.to_string(),
            ComponentStock {
                component: component(id, name),
                stock: StockEntry {
                    component_id: id.to_string(),
                    qty_on_hand: Decimal::from(qty),
                    avg_cost: Money::from_units(avg),
                    version: 3,
                    updated_at: Utc::now(),
                },
            },
        )
    }

    fn recipe(id: &str, items: &[(&str, Decimal)]) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            output_weight: Decimal::ONE,
            output_unit: "kg".to_string(),
            items: items
                .iter()
                .map(|(c, w)| RecipeItem {
                    id: format!("{id}-{c}"),
                    recipe_id: id.to_string(),
                    component_id: c.to_string(),
                    weight: *w,
                    unit: "kg".to_string(),
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    fn product(id: &str, recipe_id: &str, net: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: id.to_string(),
            code: id.to_string(),
            recipe_id: recipe_id.to_string(),
            box_gross_weight: Decimal::from(net),
            box_net_weight: Decimal::from(net),
            base_price: Money::from_units(100),
            retail1_price: Money::from_units(100),
            retail2_price: Money::from_units(100),
            created_at: now,
            updated_at: now,
        }
    }

    fn item(product_id: &str, boxes: i64) -> OrderItem {
        OrderItem {
            id: format!("oi-{product_id}"),
            order_id: "o-1".to_string(),
            product_id: product_id.to_string(),
            boxes,
            unit_price: Money::from_units(100),
            total_price: Money::from_units(100 * boxes),
        }
    }

    fn order(status: OrderStatus, total: i64) -> Order {
        let now = Utc::now();
        Order {
            id: "o-1".to_string(),
            order_number: "ORD-20261019-0001".to_string(),
            client_id: "cl-1".to_string(),
            status,
            total_boxes: 10,
            total_price: Money::from_units(total),
            cost_of_goods: Money::zero(),
            profit: Money::zero(),
            notes: None,
            items: vec![],
            created_at: now,
            updated_at: now,
            production_started_at: None,
        }
    }

    #[test]
    fn test_shared_components_are_summed_before_checking() {
        let dough = recipe("dough", &[("flour", Decimal::new(6, 1))]);
        let sweet = recipe("sweet", &[("flour", Decimal::new(5, 1)), ("sugar", Decimal::new(5, 1))]);
        let loaf = product("loaf", "dough", 2);
        let bun = product("bun", "sweet", 1);
        let loaf_item = item("loaf", 10);
        let bun_item = item("bun", 4);

        let lines = [
            OrderLine { item: &loaf_item, product: &loaf, recipe: &dough },
            OrderLine { item: &bun_item, product: &bun, recipe: &sweet },
        ];
        let req = aggregate_requirements(&lines).unwrap();

        assert_eq!(req.get("flour"), Some(Decimal::from(14)));
        assert_eq!(req.get("sugar"), Some(Decimal::from(2)));

        // 14 kg needed, only 13 on hand even though each line alone fits
        let stock: HashMap<_, _> = [stock("flour", "Flour", 13, 10), stock("sugar", "Sugar", 5, 4)]
            .into_iter()
            .collect();
        let err = plan_production(&order(OrderStatus::Draft, 1400), &req, &stock).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { ref component_name, .. } if component_name == "Flour"
        ));
    }

    #[test]
    fn test_plan_costs_and_profit() {
        let mut req = Requirements::new();
        req.add("flour", Decimal::from(12)).unwrap();
        req.add("sugar", Decimal::from(2)).unwrap();

        let stock: HashMap<_, _> = [stock("flour", "Flour", 150, 10), stock("sugar", "Sugar", 5, 4)]
            .into_iter()
            .collect();

        let plan = plan_production(&order(OrderStatus::Confirmed, 1000), &req, &stock).unwrap();

        assert_eq!(plan.consumptions.len(), 2);
        assert_eq!(plan.consumptions[0].component.id, "flour");
        assert_eq!(plan.consumptions[0].deduction.after.qty_on_hand, Decimal::from(138));
        assert_eq!(plan.consumptions[0].deduction.total_cost, Money::from_units(120));
        assert_eq!(plan.consumptions[1].deduction.total_cost, Money::from_units(8));
        assert_eq!(plan.cost_of_goods, Money::from_units(128));
        assert_eq!(plan.profit, Money::from_units(872));

        let usage = plan.consumptions[0].to_usage("u-1".to_string(), "o-1", Utc::now());
        assert_eq!(usage.qty_used, Decimal::from(12));
        assert_eq!(usage.cost_per_unit, Money::from_units(10));
        assert_eq!(usage.unit, "kg");

        let started = plan.apply_to(&order(OrderStatus::Confirmed, 1000), Utc::now());
        assert_eq!(started.status, OrderStatus::InProduction);
        assert_eq!(started.cost_of_goods, Money::from_units(128));
        assert_eq!(started.profit, Money::from_units(872));
        assert!(started.production_started_at.is_some());
    }

    #[test]
    fn test_plan_rejects_wrong_status() {
        let req = Requirements::new();
        let stock = HashMap::new();

        for status in [OrderStatus::InProduction, OrderStatus::Done, OrderStatus::Cancelled] {
            let err = plan_production(&order(status, 0), &req, &stock).unwrap_err();
            assert!(matches!(err, CoreError::InvalidState { .. }));
        }
    }

    #[test]
    fn test_plan_requires_ledger_row() {
        let mut req = Requirements::new();
        req.add("ghost", Decimal::ONE).unwrap();

        let err = plan_production(&order(OrderStatus::Draft, 0), &req, &HashMap::new()).unwrap_err();
        assert_eq!(err, CoreError::not_found("Component", "ghost"));
    }
}
