//! # bakery-core: Pure Business Logic for Bakery ERP
//!
//! This crate is the valuation and fulfillment engine. It contains every
//! business rule as pure functions with zero I/O dependencies; the storage
//! crate (`bakery-db`) loads records, calls into this crate, and persists the
//! outcome inside a single transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bakery ERP Data Flow                             │
//! │                                                                         │
//! │  Purchase ──► receiving ──► ledger::receive ──► Stock (avg cost)       │
//! │                                                                         │
//! │  Order request ──► pricing ──► Order (draft, frozen unit prices)       │
//! │                                                                         │
//! │  start production:                                                      │
//! │    OrderItems ──► bom (per item) ──► merge ──► fulfillment::plan        │
//! │                                                │                        │
//! │                   validate ALL components ◄────┘                        │
//! │                              │                                          │
//! │                   ledger::deduct (each) ──► ProductionUsage rows        │
//! │                              │                                          │
//! │                   Order { in_production, cost_of_goods, profit }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Component, Recipe, Product, Order, ...)
//! - [`money`] - Decimal-backed `Money` type
//! - [`error`] - Domain error types
//! - [`validation`] - Input sanitization and validation
//! - [`ledger`] - Weighted-average receive and deduct arithmetic
//! - [`receiving`] - Purchase intake requests
//! - [`catalog`] - Supplier, client, component, recipe, product and settings requests
//! - [`bom`] - Recipe expansion into component requirements
//! - [`pricing`] - Tier prices, markups, order totals, price lists
//! - [`fulfillment`] - Two-phase production planning
//! - [`report`] - Stock valuation and order summaries
//!
//! ## Example Usage
//!
//! ```rust
//! use bakery_core::ledger::StockLevel;
//! use bakery_core::Money;
//! use rust_decimal::Decimal;
//!
//! let stock = StockLevel::empty();
//! let receipt = stock
//!     .receive(Decimal::from(100), Money::from_units(10), Money::from_units(50))
//!     .unwrap();
//!
//! // (0 + 100*10 + 50) / 100
//! assert_eq!(receipt.after.avg_cost, Money::new(1050, 2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bom;
pub mod catalog;
pub mod error;
pub mod fulfillment;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod receiving;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum boxes of one product on a single order line.
///
/// Guards against typing 100000 instead of 100.
pub const MAX_BOXES_PER_LINE: i64 = 10_000;

/// Largest quantity, weight, price or markup accepted from input.
///
/// Keeps ledger and order arithmetic far away from the decimal range.
pub const MAX_NUMERIC_VALUE: i64 = 1_000_000_000_000;

/// Prefix of generated order numbers (`ORD-20261019-0001`).
pub const ORDER_NUMBER_PREFIX: &str = "ORD";
