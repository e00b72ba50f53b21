//! # Validation Module
//!
//! Input sanitization and validation utilities.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Numeric form input ("12.5", "", "abc")                                │
//! │  └── sanitize_decimal: blank or unparsable → 0, never an error         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Business rules (THIS MODULE)                                          │
//! │  ├── ids must be UUIDs, names non-empty                                │
//! │  ├── quantities > 0, prices and costs >= 0                             │
//! │  └── enumerated fields parsed strictly (FromStr on the enums)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Database (SQLite): NOT NULL, UNIQUE, FOREIGN KEY, CHECK               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bakery_core::validation::{sanitize_decimal, validate_positive};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(sanitize_decimal("12,5"), Decimal::new(125, 1));
//! assert_eq!(sanitize_decimal("n/a"), Decimal::ZERO);
//! assert!(validate_positive("quantity", Decimal::ZERO).is_err());
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::{MAX_BOXES_PER_LINE, MAX_NUMERIC_VALUE, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of display names.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Numeric Sanitizers
// =============================================================================

/// Coerces a free-form numeric string into a decimal.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - A comma is accepted as the decimal separator
/// - Blank or unparsable input becomes `0`; this never fails
pub fn sanitize_decimal(input: &str) -> Decimal {
    let cleaned = input.trim().replace(',', ".");
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or(Decimal::ZERO)
}

/// Sanitizes an optional numeric string (`None` → 0).
pub fn sanitize_optional_decimal(input: Option<&str>) -> Decimal {
    input.map(sanitize_decimal).unwrap_or(Decimal::ZERO)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a strictly positive value (quantities, weights).
///
/// Values above [`MAX_NUMERIC_VALUE`] are rejected with `TooLarge`.
pub fn validate_positive(field: &str, value: Decimal) -> ValidationResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    validate_magnitude(field, value)
}

/// Validates a value that may be zero but not negative (prices, costs).
///
/// Values above [`MAX_NUMERIC_VALUE`] are rejected with `TooLarge`.
pub fn validate_non_negative(field: &str, value: Decimal) -> ValidationResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    validate_magnitude(field, value)
}

fn validate_magnitude(field: &str, value: Decimal) -> ValidationResult<Decimal> {
    let max = Decimal::from(MAX_NUMERIC_VALUE);
    if value > max {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max,
        });
    }
    Ok(value)
}

/// Validates the box count of one order line.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_BOXES_PER_LINE
pub fn validate_boxes(boxes: i64) -> ValidationResult<i64> {
    if boxes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "boxes".to_string(),
        });
    }

    if boxes > MAX_BOXES_PER_LINE {
        return Err(ValidationError::OutOfRange {
            field: "boxes".to_string(),
            min: 1,
            max: MAX_BOXES_PER_LINE,
        });
    }

    Ok(boxes)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in an order.
pub fn validate_order_lines(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    if count > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name and returns it trimmed.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Trims optional text; blank becomes `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates a UUID identifier.
///
/// ## Example
/// ```rust
/// use bakery_core::validation::validate_id;
///
/// assert!(validate_id("component_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("component_id", "42").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<String> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(id.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_decimal() {
        assert_eq!(sanitize_decimal("100"), Decimal::from(100));
        assert_eq!(sanitize_decimal(" 10.50 "), Decimal::new(1050, 2));
        assert_eq!(sanitize_decimal("0,6"), Decimal::new(6, 1));
        assert_eq!(sanitize_decimal("1e2"), Decimal::from(100));

        assert_eq!(sanitize_decimal(""), Decimal::ZERO);
        assert_eq!(sanitize_decimal("   "), Decimal::ZERO);
        assert_eq!(sanitize_decimal("abc"), Decimal::ZERO);
        assert_eq!(sanitize_optional_decimal(None), Decimal::ZERO);
    }

    #[test]
    fn test_validate_positive_and_non_negative() {
        assert!(validate_positive("quantity", Decimal::new(1, 3)).is_ok());
        assert!(validate_positive("quantity", Decimal::ZERO).is_err());
        assert!(validate_positive("quantity", Decimal::from(-1)).is_err());

        assert!(validate_non_negative("price", Decimal::ZERO).is_ok());
        assert_eq!(
            validate_non_negative("price", Decimal::from(-5)),
            Err(ValidationError::Negative {
                field: "price".to_string()
            })
        );
    }

    #[test]
    fn test_values_beyond_limit_are_too_large() {
        let limit = Decimal::from(MAX_NUMERIC_VALUE);
        assert_eq!(validate_positive("quantity", limit), Ok(limit));

        let huge = sanitize_decimal("79228162514264337593543950335");
        assert_eq!(huge, Decimal::MAX);
        assert_eq!(
            validate_positive("quantity", huge),
            Err(ValidationError::TooLarge {
                field: "quantity".to_string(),
                max: limit,
            })
        );
        assert!(matches!(
            validate_non_negative("price", limit + Decimal::ONE),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_boxes() {
        assert!(validate_boxes(1).is_ok());
        assert!(validate_boxes(MAX_BOXES_PER_LINE).is_ok());

        assert!(validate_boxes(0).is_err());
        assert!(validate_boxes(-3).is_err());
        assert!(validate_boxes(MAX_BOXES_PER_LINE + 1).is_err());
    }

    #[test]
    fn test_validate_order_lines() {
        assert!(validate_order_lines(1).is_ok());
        assert!(validate_order_lines(0).is_err());
        assert!(validate_order_lines(MAX_ORDER_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "  Flour ").unwrap(), "Flour");
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" rush ".to_string())),
            Some("rush".to_string())
        );
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "not-a-uuid").is_err());
    }
}
