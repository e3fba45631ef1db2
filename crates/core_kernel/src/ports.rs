//! Ports and Adapters Infrastructure
//!
//! This module provides the foundational types for implementing the hexagonal
//! architecture (ports and adapters) pattern across all domain modules.
//!
//! Each domain defines its own port trait that extends the marker trait here.
//! Adapters implement these traits to provide either the PostgreSQL-backed
//! implementation (infra_db) or an in-memory mock for tests.
//!
//! ```rust,ignore
//! // In domain_occupancy/src/ports.rs
//! #[async_trait]
//! pub trait RoomPort: DomainPort {
//!     async fn get_room(&self, id: RoomId) -> Result<Room, PortError>;
//! }
//!
//! // In infra_db - the internal adapter
//! impl RoomPort for RoomRepository { ... }
//! ```

use std::fmt;
use thiserror::Error;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across adapters. The variants mirror
/// the outcome taxonomy of the operation surface: the first five are
/// expected caller-visible outcomes, `Timeout`/`Connection` are transient
/// and safely retryable, and `Invariant` marks a defensive check that
/// should have been unreachable.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Authentication or authorization failed
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Connection to the underlying store failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// A defensive check fired that should be unreachable
    #[error("Invariant violation: {message}")]
    Invariant { message: String },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortError::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Invariant violation error, logged distinctly as a bug signal
    pub fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(invariant = %message, "invariant violation");
        PortError::Invariant { message }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::Timeout { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if this error indicates a data conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Room", "123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Room"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_port_error_transient() {
        let timeout = PortError::Timeout {
            operation: "next_value".to_string(),
            duration_ms: 5000,
        };
        assert!(timeout.is_transient());

        let connection = PortError::connection("pool exhausted");
        assert!(connection.is_transient());

        let validation = PortError::validation("Invalid period");
        assert!(!validation.is_transient());
    }

    #[test]
    fn test_port_error_conflict() {
        let error = PortError::conflict("room at full capacity");
        assert!(error.is_conflict());
        assert!(!error.is_transient());
    }

    #[test]
    fn test_port_error_validation_field() {
        let error = PortError::validation_field("must be positive", "amount");
        match error {
            PortError::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("amount"));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_port_error_unauthorized() {
        let error = PortError::unauthorized("admin role required");
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Unauthorized"));
    }

    #[test]
    fn test_invariant_is_not_transient() {
        let error = PortError::invariant("no free bed though occupancy < capacity");
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Invariant"));
    }
}
