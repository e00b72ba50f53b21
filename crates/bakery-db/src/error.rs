//! # Database Error Types
//!
//! Error types for storage and engine operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Business rule (CoreError)         │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  DbError::{QueryFailed, ...}         DbError::Domain(CoreError)        │
//! │       │                                     │                           │
//! │       └──────────────┬──────────────────────┘                           │
//! │                      ▼                                                  │
//! │            caller matches on the variant                               │
//! │                                                                         │
//! │  Any error inside a transaction drops it → ROLLBACK                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bakery_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule rejected the operation.
    ///
    /// ## When This Occurs
    /// - Validation of a request failed
    /// - A referenced record does not exist
    /// - Insufficient stock, invalid order state, invalid recipe
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate product code
    /// - Duplicate order number
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent component, recipe or client
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A stock row changed between reading and writing it.
    ///
    /// ## When This Occurs
    /// - Two operations raced on the same component; the loser gets this
    ///   error and nothing it did is committed
    /// - Another writer held the database lock past the busy timeout
    #[error("{entity} {id} was modified concurrently, retry the operation")]
    ConcurrentModification { entity: String, id: String },

    /// A stored value could not be decoded.
    ///
    /// ## When This Occurs
    /// - A decimal column holds text that does not parse
    #[error("Invalid data in {column}: '{value}'")]
    InvalidData { column: String, value: String },

    /// Configuration could not be loaded.
    #[error("Invalid configuration {variable}: {reason}")]
    InvalidConfig { variable: String, reason: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Domain(CoreError::not_found(entity, id))
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an InvalidData error for an undecodable column.
    pub fn invalid_data(column: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::InvalidData {
            column: column.into(),
            value: value.into(),
        }
    }

    /// The business rule failure, if this is one.
    pub fn domain(&self) -> Option<&CoreError> {
        match self {
            DbError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::Domain(NotFound)
/// sqlx::Error::Database       → SQLITE_BUSY → DbError::ConcurrentModification,
///                               otherwise analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLITE_BUSY and its extended codes (BUSY_SNAPSHOT = 517, ...)
                let busy = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .is_some_and(|code| code & 0xff == SQLITE_BUSY);
                if busy {
                    return DbError::ConcurrentModification {
                        entity: "Database".to_string(),
                        id: "lock".to_string(),
                    };
                }

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Primary result code of a lock conflict with another connection.
const SQLITE_BUSY: i32 = 5;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_domain_errors_keep_their_shape() {
        let err: DbError = CoreError::InsufficientStock {
            component_id: "c-flour".to_string(),
            component_name: "Flour".to_string(),
            required: Decimal::from(200),
            available: Decimal::from(138),
        }
        .into();

        assert!(matches!(
            err.domain(),
            Some(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Flour (c-flour): required 200, available 138"
        );
    }

    #[test]
    fn test_validation_converts_to_domain() {
        let err: DbError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[test]
    fn test_row_not_found_is_domain_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));
    }
}
