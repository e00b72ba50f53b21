//! # bakery-db: Storage Layer for Bakery ERP
//!
//! This crate persists the bakery's catalog, stock ledger, purchases and
//! orders in SQLite via sqlx, and runs every engine operation that writes
//! more than one row inside a single transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bakery ERP Data Flow                             │
//! │                                                                         │
//! │  Caller (seed tool, service, tests)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bakery-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ Catalog        │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Purchase       │    │ 001_initial  │  │   │
//! │  │   │ DbConfig      │    │ Order          │    │  _schema.sql │  │   │
//! │  │   │               │    │ Production     │    │              │  │   │
//! │  │   └───────────────┘    │ Stock, Report  │    └──────────────┘  │   │
//! │  │                        └───────┬────────┘                      │   │
//! │  │                                │ pure rules                    │   │
//! │  │                                ▼                               │   │
//! │  │                        bakery-core                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (./bakery.db or BAKERY_DB_PATH)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bakery_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let purchase = db.purchases().record_purchase(&request).await?;
//! let order = db.orders().create_order(&order_request).await?;
//! let result = db.production().start_production(&order.id).await?;
//! println!("cost of goods: {}", result.cost_of_goods);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::order::OrderRepository;
pub use repository::production::ProductionRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::report::ReportRepository;
pub use repository::settings::SettingsRepository;
pub use repository::stock::StockRepository;
