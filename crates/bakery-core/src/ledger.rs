//! # Inventory Ledger Arithmetic
//!
//! Weighted-average (moving-average) costing for a single component.
//!
//! ## Receive and Deduct
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receive(qty, unit_cost, transport)                                    │
//! │    total_cost = qty × unit_cost + transport                            │
//! │    new_qty    = old_qty + qty                                          │
//! │    new_avg    = (old_qty × old_avg + total_cost) / new_qty             │
//! │                                                                         │
//! │  deduct(qty)                                                            │
//! │    qty > on hand?  → InsufficientStock, nothing changes                │
//! │    new_qty  = old_qty - qty                                            │
//! │    new_avg  = old_avg (unchanged)                                      │
//! │    charged  = qty × old_avg (captured before the change)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every receipt blends into one running average; lot identity only
//! survives in the purchase and price history trail.
//!
//! These functions compute new values; the storage layer persists them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Component, StockEntry};
use crate::validation::{validate_non_negative, validate_positive};

/// Quantity and average cost of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub qty_on_hand: Decimal,
    pub avg_cost: Money,
}

/// Result of a receipt: the level before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub before: StockLevel,
    pub after: StockLevel,
    /// `qty × unit_cost + transport`.
    pub total_cost: Money,
}

/// Result of a deduction and the cost charged to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deduction {
    pub before: StockLevel,
    pub after: StockLevel,
    pub qty: Decimal,
    /// Average cost at the moment of deduction.
    pub cost_per_unit: Money,
    pub total_cost: Money,
}

impl StockLevel {
    /// A component that has never been received.
    pub fn empty() -> Self {
        StockLevel {
            qty_on_hand: Decimal::ZERO,
            avg_cost: Money::zero(),
        }
    }

    pub fn new(qty_on_hand: Decimal, avg_cost: Money) -> Self {
        StockLevel {
            qty_on_hand,
            avg_cost,
        }
    }

    /// Inventory value at average cost.
    pub fn value(&self) -> Money {
        self.avg_cost.times(self.qty_on_hand)
    }

    /// Blends a receipt into the running average.
    ///
    /// ## Errors
    /// - `Validation` when `qty <= 0`, `unit_cost < 0` or `transport_cost < 0`
    /// - `Validation(Overflow)` when the new totals do not fit in a decimal
    pub fn receive(&self, qty: Decimal, unit_cost: Money, transport_cost: Money) -> CoreResult<Receipt> {
        validate_positive("quantity", qty)?;
        validate_non_negative("price per unit", unit_cost.amount())?;
        validate_non_negative("transport cost", transport_cost.amount())?;

        let total_cost = unit_cost
            .checked_times(qty)
            .and_then(|cost| cost.checked_add(transport_cost))
            .ok_or_else(|| overflow("total cost"))?;
        let new_qty = self
            .qty_on_hand
            .checked_add(qty)
            .ok_or_else(|| overflow("quantity on hand"))?;

        let new_avg = if new_qty > Decimal::ZERO {
            let blended = self
                .avg_cost
                .checked_times(self.qty_on_hand)
                .and_then(|carried| carried.checked_add(total_cost))
                .ok_or_else(|| overflow("stock value"))?;
            blended.per(new_qty).unwrap_or_default()
        } else {
            Money::zero()
        };

        Ok(Receipt {
            before: *self,
            after: StockLevel::new(new_qty, new_avg),
            total_cost,
        })
    }

    /// Takes `qty` out of stock at the current average cost.
    ///
    /// ## Errors
    /// - `Validation` when `qty <= 0`
    /// - `InsufficientStock` when `qty` exceeds the quantity on hand
    pub fn deduct(&self, component: &Component, qty: Decimal) -> CoreResult<Deduction> {
        // Requirements are computed, not typed in, so no input ceiling here.
        if qty <= Decimal::ZERO {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if qty > self.qty_on_hand {
            return Err(CoreError::InsufficientStock {
                component_id: component.id.clone(),
                component_name: component.name.clone(),
                required: qty,
                available: self.qty_on_hand,
            });
        }

        let cost_per_unit = self.avg_cost;

        Ok(Deduction {
            before: *self,
            after: StockLevel::new(self.qty_on_hand - qty, self.avg_cost),
            qty,
            cost_per_unit,
            total_cost: cost_per_unit
                .checked_times(qty)
                .ok_or_else(|| overflow("total cost"))?,
        })
    }
}

fn overflow(field: &str) -> CoreError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
    .into()
}

impl Default for StockLevel {
    fn default() -> Self {
        StockLevel::empty()
    }
}

impl From<&StockEntry> for StockLevel {
    fn from(entry: &StockEntry) -> Self {
        StockLevel::new(entry.qty_on_hand, entry.avg_cost)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentKind;
    use chrono::Utc;
    use proptest::prelude::*;

    fn flour() -> Component {
        Component {
            id: "c-flour".to_string(),
            name: "Flour".to_string(),
            kind: ComponentKind::RawMaterial,
            unit: "kg".to_string(),
            current_avg_price: Money::zero(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_receipt_includes_transport() {
        let receipt = StockLevel::empty()
            .receive(Decimal::from(100), Money::from_units(10), Money::from_units(50))
            .unwrap();

        assert_eq!(receipt.total_cost, Money::from_units(1050));
        assert_eq!(receipt.after.qty_on_hand, Decimal::from(100));
        assert_eq!(receipt.after.avg_cost, Money::new(1050, 2));
    }

    #[test]
    fn test_second_receipt_blends_average() {
        let first = StockLevel::empty()
            .receive(Decimal::from(100), Money::from_units(10), Money::from_units(50))
            .unwrap();
        let second = first
            .after
            .receive(Decimal::from(50), Money::from_units(9), Money::zero())
            .unwrap();

        // (100 × 10.50 + 450) / 150
        assert_eq!(second.after.qty_on_hand, Decimal::from(150));
        assert_eq!(second.after.avg_cost, Money::from_units(10));
    }

    #[test]
    fn test_receive_rejects_bad_input() {
        let stock = StockLevel::empty();
        assert!(stock
            .receive(Decimal::ZERO, Money::from_units(1), Money::zero())
            .is_err());
        assert!(stock
            .receive(Decimal::ONE, Money::from_units(-1), Money::zero())
            .is_err());
        assert!(stock
            .receive(Decimal::ONE, Money::from_units(1), Money::from_units(-1))
            .is_err());
    }

    #[test]
    fn test_free_receipt_lowers_average() {
        let stock = StockLevel::new(Decimal::from(10), Money::from_units(4));
        let receipt = stock
            .receive(Decimal::from(10), Money::zero(), Money::zero())
            .unwrap();
        assert_eq!(receipt.after.avg_cost, Money::from_units(2));
    }

    #[test]
    fn test_deduct_keeps_average_and_charges_it() {
        let stock = StockLevel::new(Decimal::from(150), Money::from_units(10));
        let deduction = stock.deduct(&flour(), Decimal::from(12)).unwrap();

        assert_eq!(deduction.after.qty_on_hand, Decimal::from(138));
        assert_eq!(deduction.after.avg_cost, Money::from_units(10));
        assert_eq!(deduction.cost_per_unit, Money::from_units(10));
        assert_eq!(deduction.total_cost, Money::from_units(120));
    }

    #[test]
    fn test_deduct_everything_is_allowed() {
        let stock = StockLevel::new(Decimal::new(55, 1), Money::from_units(3));
        let deduction = stock.deduct(&flour(), Decimal::new(55, 1)).unwrap();
        assert_eq!(deduction.after.qty_on_hand, Decimal::ZERO);
    }

    #[test]
    fn test_deduct_insufficient_reports_shortfall() {
        let stock = StockLevel::new(Decimal::from(138), Money::from_units(10));
        let err = stock.deduct(&flour(), Decimal::from(200)).unwrap_err();

        assert_eq!(
            err,
            CoreError::InsufficientStock {
                component_id: "c-flour".to_string(),
                component_name: "Flour".to_string(),
                required: Decimal::from(200),
                available: Decimal::from(138),
            }
        );
        assert_eq!(err.shortfall(), Some(Decimal::from(62)));
    }

    #[test]
    fn test_receive_beyond_decimal_range_is_an_error() {
        let stock = StockLevel::new(Decimal::MAX, Money::from_units(1));
        assert_eq!(
            stock.receive(Decimal::ONE, Money::from_units(1), Money::zero()),
            Err(CoreError::Validation(ValidationError::Overflow {
                field: "quantity on hand".to_string()
            }))
        );

        let huge = Decimal::from(crate::MAX_NUMERIC_VALUE + 1);
        assert!(matches!(
            StockLevel::empty().receive(huge, Money::from_units(2), Money::zero()),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_deduct_cost_overflow_is_an_error() {
        let stock = StockLevel::new(Decimal::MAX, Money::from_units(2));
        assert_eq!(
            stock.deduct(&flour(), Decimal::MAX),
            Err(CoreError::Validation(ValidationError::Overflow {
                field: "total cost".to_string()
            }))
        );
    }

    #[test]
    fn test_value() {
        let stock = StockLevel::new(Decimal::from(138), Money::from_units(10));
        assert_eq!(stock.value(), Money::from_units(1380));
    }

    fn receipt_strategy() -> impl Strategy<Value = (Decimal, Money, Money)> {
        (1i64..1_000_000, 0i64..100_000, 0i64..10_000).prop_map(|(q, p, t)| {
            (
                Decimal::new(q, 3),
                Money::new(p, 2),
                Money::new(t, 2),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_average_is_cost_weighted_mean(receipts in prop::collection::vec(receipt_strategy(), 1..20)) {
            let tolerance = Decimal::new(1, 12);
            let mut stock = StockLevel::empty();
            let mut total_qty = Decimal::ZERO;
            let mut total_cost = Decimal::ZERO;

            for (qty, price, transport) in receipts {
                stock = stock.receive(qty, price, transport).unwrap().after;
                total_qty += qty;
                total_cost += price.amount() * qty + transport.amount();

                let expected = total_cost / total_qty;
                prop_assert_eq!(stock.qty_on_hand, total_qty);
                prop_assert!((stock.avg_cost.amount() - expected).abs() < tolerance);
            }
        }

        #[test]
        fn prop_deduct_never_goes_negative(on_hand in 0i64..1_000_000, wanted in 1i64..2_000_000) {
            let stock = StockLevel::new(Decimal::new(on_hand, 3), Money::from_units(7));
            let qty = Decimal::new(wanted, 3);

            match stock.deduct(&flour(), qty) {
                Ok(d) => {
                    prop_assert!(d.after.qty_on_hand >= Decimal::ZERO);
                    prop_assert_eq!(d.after.qty_on_hand + qty, stock.qty_on_hand);
                }
                Err(CoreError::InsufficientStock { required, available, .. }) => {
                    prop_assert!(qty > stock.qty_on_hand);
                    prop_assert_eq!(required, qty);
                    prop_assert_eq!(available, stock.qty_on_hand);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
