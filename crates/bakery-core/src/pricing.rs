//! # Pricing Engine
//!
//! Tier price resolution, markup derivation and order totals.
//!
//! ## Tier Resolution
//! ```text
//! wholesale → product.base_price
//! retail1   → product.retail1_price
//! retail2   → product.retail2_price
//! ```
//!
//! Retail prices left blank when a product is saved are derived once from
//! the markups in effect at that moment. Changing the markups later does not
//! reprice existing products, and order lines keep the unit price they were
//! created with.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{ClientTier, Product, Settings};
use crate::validation::{
    normalize_optional, validate_boxes, validate_id, validate_non_negative, validate_order_lines,
};

// =============================================================================
// Tier Prices
// =============================================================================

/// Unit price of one box of `product` for a client of `tier`.
pub fn unit_price_for(product: &Product, tier: ClientTier) -> Money {
    match tier {
        ClientTier::Wholesale => product.base_price,
        ClientTier::Retail1 => product.retail1_price,
        ClientTier::Retail2 => product.retail2_price,
    }
}

/// `base * (1 + markup_percent / 100)`.
pub fn price_with_markup(base: Money, markup_percent: Decimal) -> Money {
    base.with_markup(markup_percent)
}

/// Stored retail prices for a product being created or updated.
///
/// Explicit prices win; missing ones are derived from `settings`.
pub fn derive_retail_prices(
    base_price: Money,
    retail1_price: Option<Money>,
    retail2_price: Option<Money>,
    settings: &Settings,
) -> (Money, Money) {
    let retail1 =
        retail1_price.unwrap_or_else(|| price_with_markup(base_price, settings.retail1_markup));
    let retail2 =
        retail2_price.unwrap_or_else(|| price_with_markup(base_price, settings.retail2_markup));
    (retail1, retail2)
}

/// Live markup view of a base price under the current settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierPrices {
    pub base: Money,
    pub wholesale: Money,
    pub retail1: Money,
    pub retail2: Money,
}

/// Computes the suggested price of every tier from `base`.
///
/// Informational only; orders are priced from the stored tier columns.
pub fn suggested_prices(base: Money, settings: &Settings) -> TierPrices {
    TierPrices {
        base,
        wholesale: price_with_markup(base, settings.wholesale_markup),
        retail1: price_with_markup(base, settings.retail1_markup),
        retail2: price_with_markup(base, settings.retail2_markup),
    }
}

// =============================================================================
// Order Pricing
// =============================================================================

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub boxes: i64,
}

/// A request to create an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    pub client_id: String,
    pub items: Vec<OrderLineRequest>,
    pub notes: Option<String>,
}

impl OrderRequest {
    /// Validates ids and box counts, returning a normalized copy.
    pub fn validate(&self) -> CoreResult<OrderRequest> {
        let client_id = validate_id("client_id", &self.client_id)?;
        validate_order_lines(self.items.len())?;

        let items = self
            .items
            .iter()
            .map(|line| -> CoreResult<OrderLineRequest> {
                Ok(OrderLineRequest {
                    product_id: validate_id("product_id", &line.product_id)?,
                    boxes: validate_boxes(line.boxes)?,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(OrderRequest {
            client_id,
            items,
            notes: normalize_optional(self.notes.clone()),
        })
    }
}

/// A priced order line.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: String,
    pub boxes: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

/// Lines and totals of a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total_boxes: i64,
    pub total_price: Money,
}

/// Prices each `(product, boxes)` line for a client tier.
pub fn price_order(tier: ClientTier, lines: &[(&Product, i64)]) -> CoreResult<PricedOrder> {
    validate_order_lines(lines.len())?;

    let mut priced = Vec::with_capacity(lines.len());
    let mut total_boxes = 0i64;
    let mut total_price = Money::zero();

    for (product, boxes) in lines {
        let boxes = validate_boxes(*boxes)?;
        let unit_price = unit_price_for(product, tier);
        validate_non_negative("unit price", unit_price.amount())?;

        let line_total = unit_price.times(Decimal::from(boxes));
        total_boxes += boxes;
        total_price += line_total;

        priced.push(PricedLine {
            product_id: product.id.clone(),
            boxes,
            unit_price,
            total_price: line_total,
        });
    }

    Ok(PricedOrder {
        lines: priced,
        total_boxes,
        total_price,
    })
}

// =============================================================================
// Price List
// =============================================================================

/// A product with its price for one tier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceListEntry {
    pub product: Product,
    pub unit_price: Money,
    /// Unit price divided by box net weight; `None` when the net weight is 0.
    pub price_per_weight_unit: Option<Money>,
}

/// Builds the price list of `tier` in the order `products` are given.
pub fn price_list(products: &[Product], tier: ClientTier) -> Vec<PriceListEntry> {
    products
        .iter()
        .map(|product| {
            let unit_price = unit_price_for(product, tier);
            PriceListEntry {
                price_per_weight_unit: unit_price.per(product.box_net_weight),
                unit_price,
                product: product.clone(),
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::Utc;

    fn product(id: &str, base: i64, net_weight: Decimal) -> Product {
        let now = Utc::now();
        let (retail1, retail2) =
            derive_retail_prices(Money::from_units(base), None, None, &Settings::default());
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            code: id.to_uppercase(),
            recipe_id: "r-1".to_string(),
            box_gross_weight: net_weight,
            box_net_weight: net_weight,
            base_price: Money::from_units(base),
            retail1_price: retail1,
            retail2_price: retail2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unit_price_per_tier() {
        let p = product("p1", 100, Decimal::from(2));
        assert_eq!(unit_price_for(&p, ClientTier::Wholesale), Money::from_units(100));
        assert_eq!(unit_price_for(&p, ClientTier::Retail1), Money::from_units(140));
        assert_eq!(unit_price_for(&p, ClientTier::Retail2), Money::from_units(170));
    }

    #[test]
    fn test_explicit_retail_prices_win() {
        let (r1, r2) = derive_retail_prices(
            Money::from_units(100),
            Some(Money::from_units(125)),
            None,
            &Settings::default(),
        );
        assert_eq!(r1, Money::from_units(125));
        assert_eq!(r2, Money::from_units(170));
    }

    #[test]
    fn test_price_with_markup() {
        assert_eq!(
            price_with_markup(Money::from_units(50), Decimal::from(10)),
            Money::from_units(55)
        );
    }

    #[test]
    fn test_suggested_prices_use_all_markups() {
        let prices = suggested_prices(Money::from_units(100), &Settings::default());
        assert_eq!(prices.base, Money::from_units(100));
        assert_eq!(prices.wholesale, Money::from_units(110));
        assert_eq!(prices.retail1, Money::from_units(140));
        assert_eq!(prices.retail2, Money::from_units(170));
    }

    #[test]
    fn test_price_order_totals() {
        let loaf = product("p1", 100, Decimal::from(2));
        let bun = product("p2", 30, Decimal::ONE);

        let priced = price_order(ClientTier::Retail1, &[(&loaf, 10), (&bun, 4)]).unwrap();

        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[0].unit_price, Money::from_units(140));
        assert_eq!(priced.lines[0].total_price, Money::from_units(1400));
        assert_eq!(priced.lines[1].total_price, Money::from_units(168));
        assert_eq!(priced.total_boxes, 14);
        assert_eq!(priced.total_price, Money::from_units(1568));
    }

    #[test]
    fn test_price_order_rejects_empty_and_bad_boxes() {
        assert!(matches!(
            price_order(ClientTier::Wholesale, &[]),
            Err(CoreError::Validation(_))
        ));

        let loaf = product("p1", 100, Decimal::ONE);
        assert!(matches!(
            price_order(ClientTier::Wholesale, &[(&loaf, 0)]),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_order_request_validation() {
        let ok = OrderRequest {
            client_id: " 550e8400-e29b-41d4-a716-446655440000 ".to_string(),
            items: vec![OrderLineRequest {
                product_id: "6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_string(),
                boxes: 3,
            }],
            notes: Some("  ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.client_id, "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(ok.notes, None);

        let bad = OrderRequest {
            client_id: "client-1".to_string(),
            items: vec![],
            notes: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_price_list_per_weight_unit() {
        let products = vec![
            product("p1", 100, Decimal::from(2)),
            product("p2", 30, Decimal::ZERO),
        ];
        let list = price_list(&products, ClientTier::Wholesale);

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].unit_price, Money::from_units(100));
        assert_eq!(list[0].price_per_weight_unit, Some(Money::from_units(50)));
        assert_eq!(list[1].price_per_weight_unit, None);
    }
}
