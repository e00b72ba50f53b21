//! # Stock Repository
//!
//! Reads and versioned writes of the per-component stock ledger.
//!
//! ## Compare-and-Swap Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read:   SELECT qty_on_hand, avg_cost, version  → version = 7          │
//! │  compute new level in bakery-core (receive / deduct)                   │
//! │  write:  UPDATE stock SET ..., version = 8                              │
//! │          WHERE component_id = ? AND version = 7                         │
//! │                                                                         │
//! │  0 rows affected → someone else wrote first                            │
//! │                  → ConcurrentModification, transaction rolled back      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock rows are only ever written by purchase intake and production
//! fulfillment, both of which go through [`write_level`].

use bakery_core::fulfillment::ComponentStock;
use bakery_core::ledger::StockLevel;
use bakery_core::{Component, ComponentKind, StockEntry};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{decimal, money, money_text, text};
use crate::error::{DbError, DbResult};

/// A component joined with its stock row.
#[derive(sqlx::FromRow)]
pub(crate) struct ComponentStockRow {
    id: String,
    name: String,
    kind: ComponentKind,
    unit: String,
    created_at: DateTime<Utc>,
    qty_on_hand: String,
    avg_cost: String,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl ComponentStockRow {
    pub(crate) fn into_component_stock(self) -> DbResult<ComponentStock> {
        let avg_cost = money("stock.avg_cost", &self.avg_cost)?;
        Ok(ComponentStock {
            stock: StockEntry {
                component_id: self.id.clone(),
                qty_on_hand: decimal("stock.qty_on_hand", &self.qty_on_hand)?,
                avg_cost,
                version: self.version,
                updated_at: self.updated_at,
            },
            component: Component {
                id: self.id,
                name: self.name,
                kind: self.kind,
                unit: self.unit,
                current_avg_price: avg_cost,
                created_at: self.created_at,
            },
        })
    }
}

/// Select list shared by every component query; the average price is read
/// from the stock row.
pub(crate) const COMPONENT_STOCK_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.kind, c.unit, c.created_at,
        s.qty_on_hand, s.avg_cost, s.version, s.updated_at
    FROM components c
    INNER JOIN stock s ON s.component_id = c.id
"#;

/// Loads one component with its stock row.
pub(crate) async fn load_component_stock(
    conn: &mut SqliteConnection,
    component_id: &str,
) -> DbResult<ComponentStock> {
    let sql = format!("{COMPONENT_STOCK_SELECT} WHERE c.id = ?1");
    let row: Option<ComponentStockRow> = sqlx::query_as(&sql)
        .bind(component_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| DbError::not_found("Component", component_id))?
        .into_component_stock()
}

/// Loads a snapshot of several components, keyed by id.
///
/// Unknown ids are simply absent; the planner reports them.
pub(crate) async fn load_snapshot<'a>(
    conn: &mut SqliteConnection,
    component_ids: impl IntoIterator<Item = &'a String>,
) -> DbResult<HashMap<String, ComponentStock>> {
    let sql = format!("{COMPONENT_STOCK_SELECT} WHERE c.id = ?1");
    let mut snapshot = HashMap::new();

    for component_id in component_ids {
        let row: Option<ComponentStockRow> = sqlx::query_as(&sql)
            .bind(component_id)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(row) = row {
            snapshot.insert(component_id.clone(), row.into_component_stock()?);
        }
    }

    Ok(snapshot)
}

/// Writes a new stock level if the row still has `expected_version`.
///
/// ## Errors
/// `ConcurrentModification` when the row changed since it was read.
pub(crate) async fn write_level(
    conn: &mut SqliteConnection,
    component_id: &str,
    expected_version: i64,
    level: StockLevel,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock SET
            qty_on_hand = ?1,
            avg_cost = ?2,
            version = version + 1,
            updated_at = ?3
        WHERE component_id = ?4 AND version = ?5
        "#,
    )
    .bind(text(level.qty_on_hand))
    .bind(money_text(level.avg_cost))
    .bind(now)
    .bind(component_id)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        warn!(component_id = %component_id, expected_version, "Stock row changed concurrently");
        return Err(DbError::ConcurrentModification {
            entity: "Stock".to_string(),
            id: component_id.to_string(),
        });
    }

    debug!(
        component_id = %component_id,
        qty_on_hand = %level.qty_on_hand,
        avg_cost = %level.avg_cost,
        "Stock level written"
    );
    Ok(())
}

/// Repository for stock ledger reads.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Current stock row of a component.
    pub async fn get(&self, component_id: &str) -> DbResult<StockEntry> {
        let mut conn = self.pool.acquire().await?;
        Ok(load_component_stock(&mut conn, component_id).await?.stock)
    }

    /// Every component with its stock, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<ComponentStock>> {
        let sql = format!("{COMPONENT_STOCK_SELECT} ORDER BY c.name, c.id");
        let rows: Vec<ComponentStockRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(ComponentStockRow::into_component_stock)
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{bakery, receive};
    use bakery_core::Money;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_new_component_has_zero_stock() {
        let bakery = bakery().await;
        let stock = bakery.db.stock().get(&bakery.flour.id).await.unwrap();

        assert_eq!(stock.qty_on_hand, Decimal::ZERO);
        assert_eq!(stock.avg_cost, Money::zero());
        assert_eq!(stock.version, 0);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let bakery = bakery().await;
        receive(&bakery, &bakery.flour, "10", "2", "0").await;

        let mut conn = bakery.db.pool().acquire().await.unwrap();
        let err = write_level(
            &mut conn,
            &bakery.flour.id,
            0,
            StockLevel::new(Decimal::from(999), Money::zero()),
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DbError::ConcurrentModification { .. }));
        drop(conn);

        let stock = bakery.db.stock().get(&bakery.flour.id).await.unwrap();
        assert_eq!(stock.qty_on_hand, Decimal::from(10));
        assert_eq!(stock.version, 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let bakery = bakery().await;
        let names: Vec<String> = bakery
            .db
            .stock()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.component.name)
            .collect();
        assert_eq!(names, vec!["Flour", "Sugar"]);
    }

    #[tokio::test]
    async fn test_unknown_component() {
        let bakery = bakery().await;
        let err = bakery.db.stock().get("nope").await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(bakery_core::CoreError::NotFound { .. })
        ));
    }
}
