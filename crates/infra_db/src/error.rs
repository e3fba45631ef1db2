//! Database error types
//!
//! Maps SQLx errors onto the error taxonomy of the operation surface:
//! constraint violations become conflicts, pool exhaustion and timeouts
//! become transient failures, and everything else stays an internal error.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction aborted (serialization failure or deadlock)
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Statement or acquisition timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Row data did not map onto the domain type
    #[error("Decode error: {0}")]
    DecodeFailed(String),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is transient and safe to retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_)
                | DatabaseError::PoolExhausted
                | DatabaseError::Timeout(_)
                | DatabaseError::TransactionFailed(_)
        )
    }
}

/// Classifies SQLx errors by PostgreSQL error code
///
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        // serialization_failure / deadlock_detected: the
                        // transaction aborted and is safe to retry
                        "40001" | "40P01" => {
                            DatabaseError::TransactionFailed(db_err.message().to_string())
                        }
                        // query_canceled fires when statement_timeout trips
                        "57014" => DatabaseError::Timeout(db_err.message().to_string()),
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::DecodeFailed(error.to_string())
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

/// Maps database errors onto the port error taxonomy
impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "Record".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry(message)
            | DatabaseError::ConstraintViolation(message) => PortError::Conflict { message },
            DatabaseError::ForeignKeyViolation(message) => PortError::Validation {
                message,
                field: None,
            },
            DatabaseError::ConnectionFailed(message) => PortError::Connection {
                message,
                source: None,
            },
            DatabaseError::PoolExhausted => PortError::Connection {
                message: "connection pool exhausted".to_string(),
                source: None,
            },
            DatabaseError::Timeout(message) => PortError::Timeout {
                operation: message,
                duration_ms: 0,
            },
            DatabaseError::TransactionFailed(message) => PortError::Connection {
                message: format!("transaction aborted: {}", message),
                source: None,
            },
            DatabaseError::QueryFailed(message) | DatabaseError::DecodeFailed(message) => {
                PortError::Internal {
                    message,
                    source: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_formatting() {
        let error = DatabaseError::not_found("Room", "ROOM-123");
        assert!(error.is_not_found());
        assert!(error.to_string().contains("Room"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(DatabaseError::PoolExhausted.is_transient());
        assert!(DatabaseError::Timeout("5s".to_string()).is_transient());
        assert!(DatabaseError::TransactionFailed("deadlock".to_string()).is_transient());
        assert!(!DatabaseError::DuplicateEntry("dup".to_string()).is_transient());
    }

    #[test]
    fn test_port_error_mapping_preserves_classification() {
        let transient: PortError = DatabaseError::PoolExhausted.into();
        assert!(transient.is_transient());

        let conflict: PortError = DatabaseError::DuplicateEntry("dup".to_string()).into();
        assert!(conflict.is_conflict());

        let aborted: PortError =
            DatabaseError::TransactionFailed("deadlock".to_string()).into();
        assert!(aborted.is_transient());
    }
}
