//! # Purchase Repository
//!
//! Purchase intake and the audit trail it leaves.
//!
//! ## record_purchase
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  1. PurchaseRequest::validate()        (sanitize numbers, check ids)   │
//! │  2. load supplier, component + stock   (NotFound otherwise)            │
//! │  3. StockLevel::receive(qty, price, transport)                         │
//! │  4. INSERT INTO purchases                                              │
//! │  5. UPDATE stock ... WHERE version = ?  (new qty, new average)         │
//! │  6. INSERT INTO price_history (source = 'purchase')                    │
//! │                                                                         │
//! │  COMMIT ← purchase and ledger never diverge                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bakery_core::ledger::StockLevel;
use bakery_core::receiving::PurchaseRequest;
use bakery_core::{PriceHistoryEntry, PriceSource, Purchase};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::catalog::load_supplier;
use super::stock::{load_component_stock, write_level};
use super::{begin_write, decimal, money, money_text, new_id, text};
use crate::error::DbResult;

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: String,
    supplier_id: String,
    component_id: String,
    quantity: String,
    unit: String,
    price_per_unit: String,
    transport_cost: String,
    total_sum: String,
    notes: Option<String>,
    purchased_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl PurchaseRow {
    fn into_purchase(self) -> DbResult<Purchase> {
        Ok(Purchase {
            quantity: decimal("purchases.quantity", &self.quantity)?,
            price_per_unit: money("purchases.price_per_unit", &self.price_per_unit)?,
            transport_cost: money("purchases.transport_cost", &self.transport_cost)?,
            total_sum: money("purchases.total_sum", &self.total_sum)?,
            id: self.id,
            supplier_id: self.supplier_id,
            component_id: self.component_id,
            unit: self.unit,
            notes: self.notes,
            purchased_at: self.purchased_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PriceHistoryRow {
    id: String,
    component_id: String,
    price: String,
    source: PriceSource,
    purchase_id: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl PriceHistoryRow {
    fn into_entry(self) -> DbResult<PriceHistoryEntry> {
        Ok(PriceHistoryEntry {
            price: money("price_history.price", &self.price)?,
            id: self.id,
            component_id: self.component_id,
            source: self.source,
            purchase_id: self.purchase_id,
            recorded_at: self.recorded_at,
        })
    }
}

/// Repository for purchase intake.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Records a purchase and blends it into the component's average cost.
    ///
    /// ## Errors
    /// - `Validation` for a non-positive quantity, negative price or
    ///   transport cost, or malformed ids
    /// - `NotFound` for an unknown supplier or component
    /// - `ConcurrentModification` if the stock row changed mid-way
    pub async fn record_purchase(&self, request: &PurchaseRequest) -> DbResult<Purchase> {
        let valid = request.validate()?;
        let now = Utc::now();

        let mut tx = begin_write(&self.pool).await?;

        load_supplier(&mut tx, &valid.supplier_id).await?;
        let current = load_component_stock(&mut tx, &valid.component_id).await?;

        let receipt = StockLevel::from(&current.stock).receive(
            valid.quantity,
            valid.price_per_unit,
            valid.transport_cost,
        )?;

        let purchase = Purchase {
            id: new_id(),
            supplier_id: valid.supplier_id,
            component_id: valid.component_id,
            quantity: valid.quantity,
            unit: valid.unit.unwrap_or_else(|| current.component.unit.clone()),
            price_per_unit: valid.price_per_unit,
            transport_cost: valid.transport_cost,
            total_sum: receipt.total_cost,
            notes: valid.notes,
            purchased_at: valid.purchased_at.unwrap_or(now),
            created_at: now,
        };

        if purchase.unit != current.component.unit {
            warn!(
                component_id = %purchase.component_id,
                purchase_unit = %purchase.unit,
                component_unit = %current.component.unit,
                "Purchase unit differs from component unit; quantities are not converted"
            );
        }

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, supplier_id, component_id,
                quantity, unit, price_per_unit, transport_cost, total_sum,
                notes, purchased_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.supplier_id)
        .bind(&purchase.component_id)
        .bind(text(purchase.quantity))
        .bind(&purchase.unit)
        .bind(money_text(purchase.price_per_unit))
        .bind(money_text(purchase.transport_cost))
        .bind(money_text(purchase.total_sum))
        .bind(&purchase.notes)
        .bind(purchase.purchased_at)
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await?;

        write_level(
            &mut tx,
            &purchase.component_id,
            current.stock.version,
            receipt.after,
            now,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO price_history (id, component_id, price, source, purchase_id, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(new_id())
        .bind(&purchase.component_id)
        .bind(money_text(purchase.price_per_unit))
        .bind(PriceSource::Purchase)
        .bind(&purchase.id)
        .bind(purchase.purchased_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            component_id = %purchase.component_id,
            quantity = %purchase.quantity,
            total_sum = %purchase.total_sum,
            qty_on_hand = %receipt.after.qty_on_hand,
            avg_cost = %receipt.after.avg_cost,
            "Purchase recorded"
        );
        Ok(purchase)
    }

    /// All purchases, newest first.
    pub async fn list_purchases(&self) -> DbResult<Vec<Purchase>> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT
                id, supplier_id, component_id,
                quantity, unit, price_per_unit, transport_cost, total_sum,
                notes, purchased_at, created_at
            FROM purchases
            ORDER BY purchased_at DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed purchases");
        rows.into_iter().map(PurchaseRow::into_purchase).collect()
    }

    /// Price points of one component, newest first.
    pub async fn price_history(&self, component_id: &str) -> DbResult<Vec<PriceHistoryEntry>> {
        let rows: Vec<PriceHistoryRow> = sqlx::query_as(
            r#"
            SELECT id, component_id, price, source, purchase_id, recorded_at
            FROM price_history
            WHERE component_id = ?1
            ORDER BY recorded_at DESC, rowid DESC
            "#,
        )
        .bind(component_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceHistoryRow::into_entry).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
