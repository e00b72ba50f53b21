//! # Repository Module
//!
//! Database repository implementations for Bakery ERP.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Transactions                        │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.production().start_production(order_id)                    │
//! │       ▼                                                                 │
//! │  ProductionRepository                                                  │
//! │       │  BEGIN IMMEDIATE  (begin_write: takes the write lock first)    │
//! │       │  load order, items, recipes, stock  (shared loaders below)     │
//! │       │  bakery_core::fulfillment::plan_production(...)                │
//! │       │  write stock (CAS), usage rows, order                          │
//! │       │  COMMIT   (any error → transaction dropped → ROLLBACK)         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Loaders shared between repositories take `&mut SqliteConnection` so they
//! run unchanged on a pooled connection or inside a transaction.
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Suppliers, clients, components, recipes, products
//! - [`SettingsRepository`](settings::SettingsRepository) - Markup singleton
//! - [`StockRepository`](stock::StockRepository) - Ledger reads and versioned writes
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchase intake, price history
//! - [`OrderRepository`](order::OrderRepository) - Order creation, status, price lists
//! - [`ProductionRepository`](production::ProductionRepository) - Production fulfillment
//! - [`ReportRepository`](report::ReportRepository) - Valuation and summaries

pub mod catalog;
pub mod order;
pub mod production;
pub mod purchase;
pub mod report;
pub mod settings;
pub mod stock;

use bakery_core::Money;
use rust_decimal::Decimal;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

use crate::error::{DbError, DbResult};

// =============================================================================
// Decimal Columns
// =============================================================================

/// Parses a TEXT decimal column.
pub(crate) fn decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| DbError::invalid_data(column, raw))
}

/// Parses a TEXT money column.
pub(crate) fn money(column: &str, raw: &str) -> DbResult<Money> {
    decimal(column, raw).map(Money::from_decimal)
}

/// Renders a decimal for a TEXT column.
pub(crate) fn text(value: Decimal) -> String {
    value.to_string()
}

/// Renders money for a TEXT column.
pub(crate) fn money_text(value: Money) -> String {
    value.amount().to_string()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Transactions
// =============================================================================

/// Opens a transaction that holds the write lock from its first statement.
///
/// Concurrent writers queue on the pool's `busy_timeout` and then read the
/// committed state, so a read-then-write sequence never fails half way with
/// SQLITE_BUSY.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

// =============================================================================
// Test Fixtures
// =============================================================================
