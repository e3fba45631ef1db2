//! Billing domain errors

use core_kernel::{Money, PortError};
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// One or more requested periods already carry an active payment
    #[error("Payment already exists for: {}", .0.join(", "))]
    PeriodsAlreadyCovered(Vec<String>),

    /// The resident has no room assigned, so no due can exist
    #[error("Resident {0} has no room assigned")]
    NoRoomAssigned(String),

    /// Settlement requested where no due amount exists
    #[error("No due amount exists for {period}")]
    NoDueAmount { period: String },

    /// Settlement amount exceeds the outstanding due
    #[error("Settlement amount {requested} exceeds outstanding due {due}")]
    ExceedsDue { requested: Money, due: Money },

    /// An identical active settlement already exists
    #[error("An identical settlement already exists for {period}")]
    DuplicateSettlement { period: String },

    /// Error from the persistence port
    #[error(transparent)]
    Port(#[from] PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    /// Returns true if the error is a transient persistence failure
    pub fn is_transient(&self) -> bool {
        matches!(self, BillingError::Port(e) if e.is_transient())
    }
}
