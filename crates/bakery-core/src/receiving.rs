//! # Purchase Intake
//!
//! Turns a raw purchase form into validated values for the ledger.
//!
//! Numeric fields arrive as text. Blank or unparsable numbers become zero
//! instead of failing; the business rules (quantity > 0, prices >= 0) then
//! decide whether the purchase is acceptable. Identifiers are validated
//! strictly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    normalize_optional, sanitize_decimal, validate_id, validate_non_negative, validate_positive,
};

/// A purchase as entered by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRequest {
    pub supplier_id: String,
    pub component_id: String,
    pub quantity: String,
    /// Unit label; blank means the component's own unit.
    pub unit: String,
    pub price_per_unit: String,
    pub transport_cost: String,
    /// Defaults to the time of recording.
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// A sanitized, validated purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPurchase {
    pub supplier_id: String,
    pub component_id: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub price_per_unit: Money,
    pub transport_cost: Money,
    /// `quantity * price_per_unit + transport_cost`.
    pub total_sum: Money,
    pub purchased_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl PurchaseRequest {
    /// Sanitizes numeric fields and applies the business rules.
    ///
    /// ## Example
    /// ```rust
    /// use bakery_core::receiving::PurchaseRequest;
    /// use bakery_core::Money;
    ///
    /// let request = PurchaseRequest {
    ///     supplier_id: "550e8400-e29b-41d4-a716-446655440000".into(),
    ///     component_id: "6ba7b810-9dad-11d1-80b4-00c04fd430c8".into(),
    ///     quantity: "100".into(),
    ///     price_per_unit: "10".into(),
    ///     transport_cost: "".into(), // blank → 0
    ///     ..Default::default()
    /// };
    /// let purchase = request.validate().unwrap();
    /// assert_eq!(purchase.total_sum, Money::from_units(1000));
    /// ```
    pub fn validate(&self) -> CoreResult<ValidPurchase> {
        let supplier_id = validate_id("supplier_id", &self.supplier_id)?;
        let component_id = validate_id("component_id", &self.component_id)?;

        let quantity = validate_positive("quantity", sanitize_decimal(&self.quantity))?;
        let price_per_unit = Money::from_decimal(validate_non_negative(
            "price per unit",
            sanitize_decimal(&self.price_per_unit),
        )?);
        let transport_cost = Money::from_decimal(validate_non_negative(
            "transport cost",
            sanitize_decimal(&self.transport_cost),
        )?);

        let total_sum = price_per_unit
            .checked_times(quantity)
            .and_then(|sum| sum.checked_add(transport_cost))
            .ok_or_else(|| ValidationError::Overflow {
                field: "total sum".to_string(),
            })?;

        Ok(ValidPurchase {
            supplier_id,
            component_id,
            quantity,
            unit: normalize_optional(Some(self.unit.clone())),
            price_per_unit,
            transport_cost,
            total_sum,
            purchased_at: self.date,
            notes: normalize_optional(self.notes.clone()),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
