//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL infrastructure for the lodging core,
//! implementing the domain port traits with SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: each repository owns a pool
//! handle and implements one or more domain ports. Every cross-entity
//! invariant is enforced with the database's atomic primitives —
//! conditional updates for occupancy, partial unique indexes for
//! double-booking and duplicate settlements, a single-statement upsert for
//! the receipt counter, and one multi-statement transaction for the room
//! reassignment.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool, RoomRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/lodging")).await?;
//! let rooms = RoomRepository::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, DatabaseConfig};
pub use error::DatabaseError;
pub use repositories::{
    PaymentRepository, ResidentRepository, RoomRepository, SequenceRepository,
    SettlementRepository, TransferRepository,
};
