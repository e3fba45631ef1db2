//! Billing Domain - Payment Ledger, Dues, and Settlements
//!
//! This crate implements the financial side of the occupancy ledger:
//!
//! - **Payment ledger**: rent and deposit payments, each stamped with a
//!   globally unique, monotonically increasing receipt number. For a given
//!   resident, at most one active non-deposit payment covers any billing
//!   period.
//! - **Due calculator**: a pure derivation of the outstanding amount for a
//!   `(resident, period)` from current ledger state; nothing about dues is
//!   ever persisted.
//! - **Settlement register**: discretionary due adjustments, validated so
//!   that payments plus settlements never exceed the room price for a
//!   period.
//! - **Receipt numbering**: a dedicated atomic-counter abstraction with a
//!   single increment-and-return capability.
//!
//! Persistence lives behind the port traits in [`ports`]; the PostgreSQL
//! adapters are provided by `infra_db`.

pub mod payment;
pub mod receipt;
pub mod dues;
pub mod settlement;
pub mod ports;
pub mod services;
pub mod error;

pub use payment::{Payment, NewPayment, PaymentUpdate, PaymentMethod, PaymentStatus};
pub use receipt::{ReceiptNumbers, SequencePort, RECEIPT_SEQUENCE};
pub use dues::{DueStatement, DueStatus, ResidentDue};
pub use settlement::{Settlement, NewSettlement, SettlementReason, SettlementOutcome};
pub use ports::{PaymentPort, SettlementPort, PaymentQuery, CallerScope};
pub use services::{PaymentLedgerService, DueService, SettlementService};
pub use error::BillingError;
