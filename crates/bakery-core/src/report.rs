//! # Reports
//!
//! Read-only aggregations over ledger and order data: stock valuation,
//! revenue and margin summaries, and the dashboard snapshot.
//!
//! Revenue, cost of goods and profit only count orders whose stock has
//! actually been consumed (`in_production` and `done`). Drafts and
//! confirmed orders have no cost yet; cancelled orders earn nothing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::fulfillment::ComponentStock;
use crate::ledger::StockLevel;
use crate::money::Money;
use crate::types::{ComponentKind, Order, OrderStatus};

// =============================================================================
// Stock Valuation
// =============================================================================

/// Value of one component's stock at average cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockValuationLine {
    pub component_id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub unit: String,
    #[ts(type = "string")]
    pub qty_on_hand: Decimal,
    pub avg_cost: Money,
    /// `qty_on_hand × avg_cost`.
    pub value: Money,
}

/// Every component's stock value and the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockValuation {
    pub lines: Vec<StockValuationLine>,
    pub total_value: Money,
}

/// Values each component's stock, in the order given.
pub fn valuate_stock(entries: &[ComponentStock]) -> StockValuation {
    let lines: Vec<StockValuationLine> = entries
        .iter()
        .map(|entry| {
            let level = StockLevel::from(&entry.stock);
            StockValuationLine {
                component_id: entry.component.id.clone(),
                name: entry.component.name.clone(),
                kind: entry.component.kind,
                unit: entry.component.unit.clone(),
                qty_on_hand: level.qty_on_hand,
                avg_cost: level.avg_cost,
                value: level.value(),
            }
        })
        .collect();

    let total_value = lines.iter().map(|line| line.value).sum();
    StockValuation { lines, total_value }
}

// =============================================================================
// Order Summary
// =============================================================================

/// Order counts by status and totals over produced orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSummary {
    pub total_orders: i64,
    pub draft: i64,
    pub confirmed: i64,
    pub in_production: i64,
    pub done: i64,
    pub cancelled: i64,
    /// Boxes on produced orders.
    pub boxes_produced: i64,
    pub revenue: Money,
    pub cost_of_goods: Money,
    pub profit: Money,
}

impl OrderSummary {
    /// Gross margin as a percentage of revenue; `None` without revenue.
    pub fn margin_percent(&self) -> Option<Decimal> {
        if self.revenue.is_zero() {
            return None;
        }
        Some((self.profit.amount() * Decimal::ONE_HUNDRED / self.revenue.amount()).round_dp(2))
    }
}

/// Whether an order's stock has been consumed.
fn is_produced(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::InProduction | OrderStatus::Done)
}

/// Counts orders by status and sums money over produced orders.
pub fn summarize_orders(orders: &[Order]) -> OrderSummary {
    let mut summary = OrderSummary::default();

    for order in orders {
        summary.total_orders += 1;
        match order.status {
            OrderStatus::Draft => summary.draft += 1,
            OrderStatus::Confirmed => summary.confirmed += 1,
            OrderStatus::InProduction => summary.in_production += 1,
            OrderStatus::Done => summary.done += 1,
            OrderStatus::Cancelled => summary.cancelled += 1,
        }

        if is_produced(order.status) {
            summary.boxes_produced += order.total_boxes;
            summary.revenue += order.total_price;
            summary.cost_of_goods += order.cost_of_goods;
            summary.profit += order.profit;
        }
    }

    summary
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnalyticsSnapshot {
    pub orders: OrderSummary,
    pub client_count: i64,
    pub product_count: i64,
    pub component_count: i64,
    pub stock_value: Money,
}

impl AnalyticsSnapshot {
    pub fn new(
        orders: OrderSummary,
        client_count: i64,
        product_count: i64,
        stock: &StockValuation,
    ) -> Self {
        AnalyticsSnapshot {
            orders,
            client_count,
            product_count,
            component_count: stock.lines.len() as i64,
            stock_value: stock.total_value,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
