//! Core Kernel - Foundational types and utilities for the lodging system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Billing period labels for rent cycles
//! - Common identifiers and value objects
//! - Port infrastructure shared by all adapters

pub mod money;
pub mod period;
pub mod identifiers;
pub mod lifecycle;
pub mod ports;
pub mod notification;

pub use money::{Money, Currency, MoneyError};
pub use period::{BillingPeriod, PeriodError};
pub use identifiers::{RoomId, ResidentId, PaymentId, SettlementId, RoomChangeId};
pub use lifecycle::Lifecycle;
pub use ports::{PortError, DomainPort};
pub use notification::{NotificationEvent, NotificationType, NotificationAudience, NotifierPort};
