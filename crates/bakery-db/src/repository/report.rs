//! # Report Repository
//!
//! Read-only views over the ledger and orders. Each report reads from one
//! connection so its numbers come from a single point in time.

use bakery_core::report::{
    summarize_orders, valuate_stock, AnalyticsSnapshot, OrderSummary, StockValuation,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::order::load_orders;
use super::stock::{ComponentStockRow, COMPONENT_STOCK_SELECT};
use crate::error::DbResult;

async fn load_valuation(conn: &mut SqliteConnection) -> DbResult<StockValuation> {
    let sql = format!("{COMPONENT_STOCK_SELECT} ORDER BY c.name, c.id");
    let rows: Vec<ComponentStockRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    let entries = rows
        .into_iter()
        .map(ComponentStockRow::into_component_stock)
        .collect::<DbResult<Vec<_>>>()?;
    Ok(valuate_stock(&entries))
}

async fn count(conn: &mut SqliteConnection, table: &str) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    Ok(sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?)
}

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Quantity on hand times average cost, per component and in total.
    pub async fn stock_valuation(&self) -> DbResult<StockValuation> {
        let mut conn = self.pool.acquire().await?;
        let valuation = load_valuation(&mut conn).await?;
        debug!(
            components = valuation.lines.len(),
            total_value = %valuation.total_value,
            "Stock valuated"
        );
        Ok(valuation)
    }

    /// Order counts by status; revenue, cost and profit of produced orders.
    pub async fn order_summary(&self) -> DbResult<OrderSummary> {
        let mut conn = self.pool.acquire().await?;
        let orders = load_orders(&mut conn, None).await?;
        Ok(summarize_orders(&orders))
    }

    /// Dashboard headline numbers.
    pub async fn analytics(&self) -> DbResult<AnalyticsSnapshot> {
        let mut tx = self.pool.begin().await?;

        let orders = load_orders(&mut tx, None).await?;
        let valuation = load_valuation(&mut tx).await?;
        let clients = count(&mut tx, "clients").await?;
        let products = count(&mut tx, "products").await?;

        tx.commit().await?;

        Ok(AnalyticsSnapshot::new(
            summarize_orders(&orders),
            clients,
            products,
            &valuation,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::testing::{bakery, receive};
    use bakery_core::pricing::{OrderLineRequest, OrderRequest};
    use bakery_core::{Money, OrderStatus};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_stock_valuation() {
        let bakery = bakery().await;
        receive(&bakery, &bakery.flour, "100", "10", "50").await;
        receive(&bakery, &bakery.sugar, "20", "3", "0").await;

        let valuation = bakery.db.reports().stock_valuation().await.unwrap();
        assert_eq!(valuation.lines.len(), 2);
        assert_eq!(valuation.lines[0].name, "Flour");
        assert_eq!(valuation.lines[0].value, Money::from_units(1050));
        assert_eq!(valuation.lines[1].qty_on_hand, Decimal::from(20));
        assert_eq!(valuation.total_value, Money::from_units(1110));
    }

    #[tokio::test]
    async fn test_analytics_after_production() {
        let bakery = bakery().await;
        receive(&bakery, &bakery.flour, "100", "10", "0").await;

        let draft = bakery
            .db
            .orders()
            .create_order(&OrderRequest {
                client_id: bakery.wholesale.id.clone(),
                items: vec![OrderLineRequest {
                    product_id: bakery.loaf.id.clone(),
                    boxes: 5,
                }],
                notes: None,
            })
            .await
            .unwrap();
        let produced = bakery
            .db
            .orders()
            .create_order(&OrderRequest {
                client_id: bakery.wholesale.id.clone(),
                items: vec![OrderLineRequest {
                    product_id: bakery.loaf.id.clone(),
                    boxes: 10,
                }],
                notes: None,
            })
            .await
            .unwrap();
        bakery.db.production().start_production(&produced.id).await.unwrap();

        let summary = bakery.db.reports().order_summary().await.unwrap();
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.draft, 1);
        assert_eq!(summary.in_production, 1);
        assert_eq!(summary.boxes_produced, 10);
        assert_eq!(summary.revenue, Money::from_units(1000));
        assert_eq!(summary.cost_of_goods, Money::from_units(120));
        assert_eq!(summary.profit, Money::from_units(880));

        let snapshot = bakery.db.reports().analytics().await.unwrap();
        assert_eq!(snapshot.client_count, 2);
        assert_eq!(snapshot.product_count, 2);
        assert_eq!(snapshot.component_count, 2);
        // 88 kg flour left at 10
        assert_eq!(snapshot.stock_value, Money::from_units(880));
        assert_eq!(snapshot.orders, summary);

        let still_draft = bakery.db.orders().get_order(&draft.id).await.unwrap();
        assert_eq!(still_draft.status, OrderStatus::Draft);
    }
}
