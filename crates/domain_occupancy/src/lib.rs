//! Occupancy Domain - Room Directory, Bed Allocation, and Reassignment
//!
//! This crate owns the authoritative room records and the rules that keep
//! them consistent:
//!
//! - Rooms have a hard capacity; `0 <= current_occupancy <= capacity` holds
//!   at all times.
//! - Beds are per-room ordinals `1..=capacity`; a resident holds at most one
//!   bed, and the allocator always hands out the lowest free ordinal.
//! - Moving a resident between rooms is the only multi-entity atomic
//!   operation in the system, modelled as an explicit
//!   Validate → Reserve → Commit | Abort plan.
//!
//! Persistence lives behind the port traits in [`ports`]; the PostgreSQL
//! adapters are provided by `infra_db`, and in-memory mocks back the
//! service tests.

pub mod room;
pub mod resident;
pub mod transfer;
pub mod events;
pub mod ports;
pub mod services;
pub mod error;

pub use room::{Room, Building, RoomType, RoomStatus, NewRoom, RoomUpdate, lowest_free_bed};
pub use resident::{Resident, ApprovalStatus};
pub use transfer::{TransferPlan, TransferStatus, RoomChangeRecord};
pub use events::OccupancyEvent;
pub use ports::{RoomPort, ResidentPort, TransferPort, RoomQuery};
pub use services::{RoomDirectoryService, TransferService, RoomWithResidents, ResidentSummary};
pub use error::OccupancyError;
