//! # Schema Migrations
//!
//! The bakery schema ships inside the binary via `sqlx::migrate!`.
//!
//! ## Schema at a Glance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  001_initial_schema.sql                                                 │
//! │                                                                         │
//! │  catalog     suppliers, clients, components, recipes, recipe_items,    │
//! │              products, settings (single row)                           │
//! │  ledger      stock (one versioned row per component)                   │
//! │  trail       purchases, price_history, production_usage                │
//! │              └── append-only: UPDATE/DELETE triggers RAISE(ABORT)      │
//! │  orders      orders, order_items                                       │
//! │                                                                         │
//! │  Decimals are TEXT so quantities and costs keep every digit.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Applied migrations are recorded in `_sqlx_migrations`. A file that has
//! been applied anywhere is frozen; schema changes go in a new
//! `NNN_description.sql` with the next number.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration the database has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await.unwrap_or((MIGRATOR.migrations.len(), 0));
    debug!(total, applied, "Schema version before migrating");

    MIGRATOR.run(pool).await?;

    info!(total, "Schema up to date");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
///
/// Fails when the bookkeeping table does not exist yet.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), usize::try_from(applied).unwrap_or(0)))
}
