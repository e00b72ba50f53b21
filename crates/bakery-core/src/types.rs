//! # Domain Types
//!
//! Core domain records used throughout Bakery ERP.
//!
//! ## Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Component ◄──── RecipeItem ────► Recipe ◄──── Product                 │
//! │      │            (weight per                   (box net weight,        │
//! │      │             batch)                        tier prices)           │
//! │      ▼                                               ▲                  │
//! │  StockEntry (qty, avg cost)                          │                  │
//! │      ▲                                           OrderItem ──► Order    │
//! │      │                                          (frozen price)  │       │
//! │  Purchase + PriceHistory                                        ▼       │
//! │                                                 ProductionUsage rows    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are plain values composed by id; there is no inheritance between
//! Recipe, Product and Order.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Component
// =============================================================================

/// What a component is used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    RawMaterial,
    SemiFinished,
    Packaging,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [
        ComponentKind::RawMaterial,
        ComponentKind::SemiFinished,
        ComponentKind::Packaging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::RawMaterial => "raw_material",
            ComponentKind::SemiFinished => "semi_finished",
            ComponentKind::Packaging => "packaging",
        }
    }
}

impl FromStr for ComponentKind {
    type Err = ValidationError;

    /// Accepts `raw_material`, `raw material` and `raw-material` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        ComponentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: ComponentKind::ALL
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect(),
            })
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw material, semi-finished good or packaging item.
///
/// `current_avg_price` is a read projection of the component's stock row;
/// it is never written on its own.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub kind: ComponentKind,
    /// Unit of measure label ("kg", "pcs"). Never converted.
    pub unit: String,
    pub current_avg_price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// One ledger row per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockEntry {
    pub component_id: String,
    /// Quantity on hand in the component's unit. Never negative.
    #[ts(type = "string")]
    pub qty_on_hand: Decimal,
    /// Weighted-average cost per unit.
    pub avg_cost: Money,
    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Parties
// =============================================================================

/// A supplier of components.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Client classification selecting which product price column applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ClientTier {
    Wholesale,
    #[serde(rename = "retail1")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "retail1"))]
    Retail1,
    #[serde(rename = "retail2")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "retail2"))]
    Retail2,
}

impl ClientTier {
    pub const ALL: [ClientTier; 3] = [ClientTier::Wholesale, ClientTier::Retail1, ClientTier::Retail2];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientTier::Wholesale => "wholesale",
            ClientTier::Retail1 => "retail1",
            ClientTier::Retail2 => "retail2",
        }
    }
}

impl Default for ClientTier {
    fn default() -> Self {
        ClientTier::Wholesale
    }
}

impl FromStr for ClientTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ClientTier::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "tier".to_string(),
                allowed: ClientTier::ALL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            })
    }
}

impl fmt::Display for ClientTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client placing orders.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
    pub tier: ClientTier,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Purchases & Price History
// =============================================================================

/// Immutable record of one receiving event.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub supplier_id: String,
    pub component_id: String,
    #[ts(type = "string")]
    pub quantity: Decimal,
    pub unit: String,
    pub price_per_unit: Money,
    pub transport_cost: Money,
    /// `quantity * price_per_unit + transport_cost`.
    pub total_sum: Money,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub purchased_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Where a price history point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Purchase,
}

/// One point of a component's purchase price time series.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceHistoryEntry {
    pub id: String,
    pub component_id: String,
    pub price: Money,
    pub source: PriceSource,
    /// Purchase the point was recorded from.
    pub purchase_id: Option<String>,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Recipe
// =============================================================================

/// A bill of materials for one batch of output.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    /// Weight one batch yields.
    #[ts(type = "string")]
    pub output_weight: Decimal,
    pub output_unit: String,
    pub items: Vec<RecipeItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Weight of one component consumed per batch of the recipe.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeItem {
    pub id: String,
    pub recipe_id: String,
    pub component_id: String,
    #[ts(type = "string")]
    pub weight: Decimal,
    pub unit: String,
}

// =============================================================================
// Product
// =============================================================================

/// A sellable box of finished goods made from one recipe.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Business identifier, unique.
    pub code: String,
    pub recipe_id: String,
    #[ts(type = "string")]
    pub box_gross_weight: Decimal,
    /// Finished-goods weight packed per box; scales the recipe.
    #[ts(type = "string")]
    pub box_net_weight: Decimal,
    /// Wholesale price.
    pub base_price: Money,
    pub retail1_price: Money,
    pub retail2_price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order.
///
/// ## State Machine
/// ```text
///   draft ──(manual)──► confirmed
///     │                    │
///     └──(start production)┴──► in_production ──(manual)──► done
///
///   draft | confirmed | in_production ──(manual)──► cancelled
///
///   done, cancelled: terminal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    InProduction,
    Done,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Draft,
        OrderStatus::Confirmed,
        OrderStatus::InProduction,
        OrderStatus::Done,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProduction => "in_production",
            OrderStatus::Done => "done",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Done | OrderStatus::Cancelled)
    }

    /// Production may start only from `draft` or `confirmed`.
    pub fn can_start_production(&self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::Confirmed)
    }

    /// Whether `self → next` is an edge of the state machine.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Draft, Confirmed) => true,
            (Draft | Confirmed, InProduction) => true,
            (InProduction, Done) => true,
            (Draft | Confirmed | InProduction, Cancelled) => true,
            _ => false,
        }
    }

    /// Validates a status change requested by a user.
    ///
    /// `in_production` is reachable only through starting production, which
    /// also consumes stock, so a manual jump there is rejected.
    pub fn validate_manual_transition(&self, next: OrderStatus) -> CoreResult<()> {
        if next == OrderStatus::InProduction || !self.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Draft
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL
                    .iter()
                    .map(|st| st.as_str().to_string())
                    .collect(),
            })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A client order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub client_id: String,
    pub status: OrderStatus,
    pub total_boxes: i64,
    /// Revenue.
    pub total_price: Money,
    pub cost_of_goods: Money,
    /// `total_price - cost_of_goods`.
    pub profit: Money,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub production_started_at: Option<DateTime<Utc>>,
}

/// Human-readable order number: `ORD-YYYYMMDD-NNNN`.
///
/// `sequence` is 1-based and counts orders created on `date` (UTC).
pub fn format_order_number(date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}-{}-{:04}",
        crate::ORDER_NUMBER_PREFIX,
        date.format("%Y%m%d"),
        sequence
    )
}

/// A line of an order.
/// Uses snapshot pattern to freeze the unit price at order creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub boxes: i64,
    /// Tier price at the time the order was created (frozen).
    pub unit_price: Money,
    /// `unit_price * boxes`.
    pub total_price: Money,
}

// =============================================================================
// Production Usage
// =============================================================================

/// Append-only record of what an order consumed and at what cost.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductionUsage {
    pub id: String,
    pub order_id: String,
    pub component_id: String,
    #[ts(type = "string")]
    pub qty_used: Decimal,
    pub unit: String,
    /// Average cost at the moment of deduction.
    pub cost_per_unit: Money,
    pub total_cost: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Outcome of starting production on an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FulfillmentResult {
    pub order: Order,
    pub cost_of_goods: Money,
    pub profit: Money,
    pub usages: Vec<ProductionUsage>,
}

// =============================================================================
// Settings
// =============================================================================

/// Default wholesale markup, percent.
pub const DEFAULT_WHOLESALE_MARKUP: i64 = 10;
/// Default retail tier 1 markup, percent.
pub const DEFAULT_RETAIL1_MARKUP: i64 = 40;
/// Default retail tier 2 markup, percent.
pub const DEFAULT_RETAIL2_MARKUP: i64 = 70;

/// Markup percentages used to derive tier prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settings {
    #[ts(type = "string")]
    pub wholesale_markup: Decimal,
    #[ts(type = "string")]
    pub retail1_markup: Decimal,
    #[ts(type = "string")]
    pub retail2_markup: Decimal,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            wholesale_markup: Decimal::from(DEFAULT_WHOLESALE_MARKUP),
            retail1_markup: Decimal::from(DEFAULT_RETAIL1_MARKUP),
            retail2_markup: Decimal::from(DEFAULT_RETAIL2_MARKUP),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Draft);
    }

    #[test]
    fn test_format_order_number() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(format_order_number(date, 7), "ORD-20261019-0007");
        assert_eq!(format_order_number(date, 12345), "ORD-20261019-12345");
    }

    #[test]
    fn test_state_machine_edges() {
        use OrderStatus::*;
        assert!(Draft.can_transition_to(Confirmed));
        assert!(Draft.can_transition_to(InProduction));
        assert!(Confirmed.can_transition_to(InProduction));
        assert!(InProduction.can_transition_to(Done));
        assert!(InProduction.can_transition_to(Cancelled));

        assert!(!Confirmed.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Done));
        assert!(!Draft.can_transition_to(Draft));

        for next in OrderStatus::ALL {
            assert!(!Done.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_manual_transition_rejects_production_jump() {
        let err = OrderStatus::Confirmed
            .validate_manual_transition(OrderStatus::InProduction)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: "confirmed".to_string(),
                to: "in_production".to_string(),
            }
        );

        assert!(OrderStatus::Draft
            .validate_manual_transition(OrderStatus::Confirmed)
            .is_ok());
        assert!(OrderStatus::InProduction
            .validate_manual_transition(OrderStatus::Done)
            .is_ok());
        assert!(OrderStatus::Done
            .validate_manual_transition(OrderStatus::Cancelled)
            .is_err());
    }

    #[test]
    fn test_parse_enums_strictly() {
        assert_eq!("retail1".parse::<ClientTier>().unwrap(), ClientTier::Retail1);
        assert_eq!(" Wholesale ".parse::<ClientTier>().unwrap(), ClientTier::Wholesale);
        assert!("retail3".parse::<ClientTier>().is_err());

        assert_eq!(
            "in_production".parse::<OrderStatus>().unwrap(),
            OrderStatus::InProduction
        );
        assert!("shipped".parse::<OrderStatus>().is_err());

        assert_eq!(
            "raw material".parse::<ComponentKind>().unwrap(),
            ComponentKind::RawMaterial
        );
        assert_eq!(
            "semi-finished".parse::<ComponentKind>().unwrap(),
            ComponentKind::SemiFinished
        );
        assert!("liquid".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&ClientTier::Retail2).unwrap(), "\"retail2\"");
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProduction).unwrap(),
            "\"in_production\""
        );
        assert_eq!(
            serde_json::to_string(&ComponentKind::RawMaterial).unwrap(),
            "\"raw_material\""
        );
    }

    #[test]
    fn test_settings_default_markups() {
        let settings = Settings::default();
        assert_eq!(settings.wholesale_markup, Decimal::from(10));
        assert_eq!(settings.retail1_markup, Decimal::from(40));
        assert_eq!(settings.retail2_markup, Decimal::from(70));
    }
}
