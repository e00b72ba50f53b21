//! # Error Types
//!
//! Domain-specific error types for bakery-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bakery-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bakery-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (component, order, quantities)
//! 3. Errors are enum variants, never String
//! 4. Every variant is recoverable and carries enough detail for a UI message

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    ///
    /// ## When This Occurs
    /// - Component, recipe, product, order, client or supplier id is unknown
    /// - A recipe item points at a component that was never registered
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Starting production on an order that is `in_production`, `done`
    ///   or `cancelled` (including a second start on the same order)
    #[error("Order {order_id} is {status}, cannot {operation}")]
    InvalidState {
        order_id: String,
        status: String,
        operation: String,
    },

    /// A manual status change is not an edge of the order state machine.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Aggregated requirement exceeds the quantity on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Start production (order: 100 boxes of Loaf)
    ///      │
    ///      ▼
    /// Aggregate: Flour 200 kg, on hand 138 kg
    ///      │
    ///      ▼
    /// InsufficientStock { component_name: "Flour", required: 200, available: 138 }
    ///      │
    ///      ▼
    /// UI shows: "Not enough Flour: need 200, have 138"
    /// ```
    #[error(
        "Insufficient stock for {component_name} ({component_id}): required {required}, available {available}"
    )]
    InsufficientStock {
        component_id: String,
        component_name: String,
        required: Decimal,
        available: Decimal,
    },

    /// Recipe cannot be expanded (non-positive output weight, no items).
    #[error("Invalid recipe {recipe_id}: {reason}")]
    InvalidRecipe { recipe_id: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidRecipe error.
    pub fn invalid_recipe(recipe_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidRecipe {
            recipe_id: recipe_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns the shortfall for an `InsufficientStock` error.
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            CoreError::InsufficientStock {
                required,
                available,
                ..
            } => Some(*required - *available),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Identifiers and enumerated fields are validated strictly; free-form
/// numeric input is sanitized first (see [`crate::validation`]), so these
/// only fire for values that parsed but break a business rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value is above the largest quantity or amount the ledger accepts.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: Decimal },

    /// An intermediate result does not fit in a decimal.
    #[error("{field} is too large to compute")]
    Overflow { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A collection that needs at least one element is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            component_id: "c-1".to_string(),
            component_name: "Flour".to_string(),
            required: Decimal::from(200),
            available: Decimal::from(138),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Flour (c-1): required 200, available 138"
        );
        assert_eq!(err.shortfall(), Some(Decimal::from(62)));
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::InvalidState {
            order_id: "o-1".to_string(),
            status: "done".to_string(),
            operation: "start production".to_string(),
        };
        assert_eq!(err.to_string(), "Order o-1 is done, cannot start production");
        assert_eq!(err.shortfall(), None);
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Negative {
            field: "transport cost".to_string(),
        };
        assert_eq!(err.to_string(), "transport cost must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Empty {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
