//! Occupancy Domain Ports
//!
//! Port interfaces for the occupancy domain, enabling swappable
//! implementations (PostgreSQL in `infra_db`, in-memory mock for tests).
//!
//! Every cross-entity invariant is enforced through the port's atomic
//! operations, never by a caller-side read-compute-write sequence:
//!
//! - `reserve_slot` / `release_slot` are conditional occupancy updates
//!   guarded by `current_occupancy < capacity` / `> 0`.
//! - `archive_room` only succeeds while occupancy is zero.
//! - `TransferPort::execute` commits the whole reassignment atomically or
//!   not at all.

use async_trait::async_trait;
use core_kernel::{DomainPort, Money, PortError, ResidentId, RoomId};

use crate::resident::Resident;
use crate::room::{Building, Room, RoomStatus};
use crate::transfer::{RoomChangeRecord, TransferPlan};

/// Query parameters for listing rooms
#[derive(Debug, Clone, Default)]
pub struct RoomQuery {
    /// Filter by building
    pub building: Option<Building>,
    /// Filter by operational status
    pub status: Option<RoomStatus>,
    /// Include archived rooms (default queries exclude them)
    pub include_archived: bool,
}

/// Port for the authoritative room records
#[async_trait]
pub trait RoomPort: DomainPort {
    /// Persists a new room
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if an active room with the same
    /// `(building, floor, room_number)` identity already exists.
    async fn create_room(&self, room: &Room) -> Result<(), PortError>;

    /// Retrieves an active room by id
    async fn get_room(&self, id: RoomId) -> Result<Room, PortError>;

    /// Finds an active room by its human identity key
    async fn find_by_identity(
        &self,
        building: Building,
        floor: i16,
        room_number: &str,
    ) -> Result<Option<Room>, PortError>;

    /// Lists rooms matching the query
    async fn list_rooms(&self, query: RoomQuery) -> Result<Vec<Room>, PortError>;

    /// Writes back a room's descriptive fields
    ///
    /// Occupancy is deliberately not writable here; it only moves through
    /// `reserve_slot`, `release_slot`, and the transfer transaction.
    async fn update_room(&self, room: &Room) -> Result<(), PortError>;

    /// Archives a room, conditional on zero occupancy
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the room still has residents.
    async fn archive_room(&self, id: RoomId) -> Result<(), PortError>;

    /// Bed ordinals currently held by active residents of the room
    async fn occupied_beds(&self, id: RoomId) -> Result<Vec<i16>, PortError>;

    /// Atomically claims one unit of capacity, returning the updated room
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the room is full or not accepting
    /// assignments.
    async fn reserve_slot(&self, id: RoomId) -> Result<Room, PortError>;

    /// Atomically returns one unit of capacity, returning the updated room
    async fn release_slot(&self, id: RoomId) -> Result<Room, PortError>;
}

/// Port for resident records
#[async_trait]
pub trait ResidentPort: DomainPort {
    /// Persists a new resident
    async fn create_resident(&self, resident: &Resident) -> Result<(), PortError>;

    /// Retrieves an active resident by id
    async fn get_resident(&self, id: ResidentId) -> Result<Resident, PortError>;

    /// Active residents currently assigned to a room
    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Resident>, PortError>;

    /// Writes back a resident
    async fn update_resident(&self, resident: &Resident) -> Result<(), PortError>;

    /// Atomically adds to the deposit total and approves a pending
    /// registration, returning the updated resident
    async fn add_deposit(&self, id: ResidentId, amount: Money) -> Result<Resident, PortError>;
}

/// Port for the atomic room reassignment transaction
#[async_trait]
pub trait TransferPort: DomainPort {
    /// Commits a validated transfer plan atomically
    ///
    /// The adapter re-checks capacity and recomputes the target bed under
    /// transaction isolation. On any failure the transaction aborts with no
    /// partial mutation visible; aborts surface as transient errors and are
    /// safely retryable.
    async fn execute(&self, plan: &TransferPlan) -> Result<RoomChangeRecord, PortError>;

    /// Room change history for a resident, newest first
    async fn list_changes(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<RoomChangeRecord>, PortError>;
}

/// In-memory adapter implementing all occupancy ports for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::room::lowest_free_bed;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    struct State {
        rooms: HashMap<RoomId, Room>,
        residents: HashMap<ResidentId, Resident>,
        changes: Vec<RoomChangeRecord>,
    }

    /// In-memory mock backing `RoomPort`, `ResidentPort`, and `TransferPort`
    ///
    /// The single `RwLock` over the whole state gives the mock the same
    /// atomicity the SQL adapters get from transactions.
    #[derive(Debug, Default, Clone)]
    pub struct MockOccupancyAdapter {
        state: Arc<RwLock<State>>,
        fail_transfers: Arc<AtomicBool>,
    }

    impl MockOccupancyAdapter {
        /// Creates an empty mock
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent transfer abort with a transient error
        pub fn poison_transfers(&self) {
            self.fail_transfers.store(true, Ordering::SeqCst);
        }

        /// Seeds a room
        pub async fn seed_room(&self, room: Room) {
            self.state.write().await.rooms.insert(room.room_id, room);
        }

        /// Seeds a resident
        pub async fn seed_resident(&self, resident: Resident) {
            self.state
                .write()
                .await
                .residents
                .insert(resident.resident_id, resident);
        }

        /// Snapshot of a room for assertions
        pub async fn room_snapshot(&self, id: RoomId) -> Option<Room> {
            self.state.read().await.rooms.get(&id).cloned()
        }

        /// Snapshot of a resident for assertions
        pub async fn resident_snapshot(&self, id: ResidentId) -> Option<Resident> {
            self.state.read().await.residents.get(&id).cloned()
        }
    }

    impl DomainPort for MockOccupancyAdapter {}

    #[async_trait]
    impl RoomPort for MockOccupancyAdapter {
        async fn create_room(&self, room: &Room) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let collision = state.rooms.values().any(|r| {
                r.lifecycle.is_active()
                    && r.identity_key() == room.identity_key()
                    && r.room_id != room.room_id
            });
            if collision {
                return Err(PortError::conflict(format!(
                    "Room {} already exists on floor {} of building {}",
                    room.room_number, room.floor, room.building
                )));
            }
            state.rooms.insert(room.room_id, room.clone());
            Ok(())
        }

        async fn get_room(&self, id: RoomId) -> Result<Room, PortError> {
            self.state
                .read()
                .await
                .rooms
                .get(&id)
                .filter(|r| r.lifecycle.is_active())
                .cloned()
                .ok_or_else(|| PortError::not_found("Room", id))
        }

        async fn find_by_identity(
            &self,
            building: Building,
            floor: i16,
            room_number: &str,
        ) -> Result<Option<Room>, PortError> {
            Ok(self
                .state
                .read()
                .await
                .rooms
                .values()
                .find(|r| {
                    r.lifecycle.is_active()
                        && r.building == building
                        && r.floor == floor
                        && r.room_number == room_number
                })
                .cloned())
        }

        async fn list_rooms(&self, query: RoomQuery) -> Result<Vec<Room>, PortError> {
            let state = self.state.read().await;
            let mut rooms: Vec<Room> = state
                .rooms
                .values()
                .filter(|r| query.include_archived || r.lifecycle.is_active())
                .filter(|r| query.building.map_or(true, |b| r.building == b))
                .filter(|r| query.status.map_or(true, |s| r.status == s))
                .cloned()
                .collect();
            rooms.sort_by(|a, b| {
                (a.building.as_str(), a.floor, &a.room_number)
                    .cmp(&(b.building.as_str(), b.floor, &b.room_number))
            });
            Ok(rooms)
        }

        async fn update_room(&self, room: &Room) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let collision = state.rooms.values().any(|r| {
                r.lifecycle.is_active()
                    && r.room_id != room.room_id
                    && r.identity_key() == room.identity_key()
            });
            if collision {
                return Err(PortError::conflict(format!(
                    "Room {} already exists on floor {} of building {}",
                    room.room_number, room.floor, room.building
                )));
            }
            let existing = state
                .rooms
                .get_mut(&room.room_id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Room", room.room_id))?;
            let occupancy = existing.current_occupancy;
            *existing = room.clone();
            // Occupancy is not writable through updates
            existing.current_occupancy = occupancy;
            Ok(())
        }

        async fn archive_room(&self, id: RoomId) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let room = state
                .rooms
                .get_mut(&id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Room", id))?;
            if room.current_occupancy > 0 {
                return Err(PortError::conflict(format!(
                    "Room {} still has {} resident(s)",
                    room.label(),
                    room.current_occupancy
                )));
            }
            room.lifecycle = core_kernel::Lifecycle::Archived;
            Ok(())
        }

        async fn occupied_beds(&self, id: RoomId) -> Result<Vec<i16>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .residents
                .values()
                .filter(|r| r.lifecycle.is_active() && r.room_id == Some(id))
                .filter_map(|r| r.bed_number)
                .collect())
        }

        async fn reserve_slot(&self, id: RoomId) -> Result<Room, PortError> {
            let mut state = self.state.write().await;
            let room = state
                .rooms
                .get_mut(&id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Room", id))?;
            if room.status == RoomStatus::Maintenance {
                return Err(PortError::conflict(format!(
                    "Room {} is under maintenance",
                    room.label()
                )));
            }
            if !room.has_spare_capacity() {
                return Err(PortError::conflict(format!(
                    "Room {} is at full capacity",
                    room.label()
                )));
            }
            room.current_occupancy += 1;
            room.status = room.derive_status();
            Ok(room.clone())
        }

        async fn release_slot(&self, id: RoomId) -> Result<Room, PortError> {
            let mut state = self.state.write().await;
            let room = state
                .rooms
                .get_mut(&id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Room", id))?;
            if room.current_occupancy == 0 {
                return Err(PortError::invariant(format!(
                    "Release on empty room {}",
                    room.label()
                )));
            }
            room.current_occupancy -= 1;
            room.status = room.derive_status();
            Ok(room.clone())
        }
    }

    #[async_trait]
    impl ResidentPort for MockOccupancyAdapter {
        async fn create_resident(&self, resident: &Resident) -> Result<(), PortError> {
            self.state
                .write()
                .await
                .residents
                .insert(resident.resident_id, resident.clone());
            Ok(())
        }

        async fn get_resident(&self, id: ResidentId) -> Result<Resident, PortError> {
            self.state
                .read()
                .await
                .residents
                .get(&id)
                .filter(|r| r.lifecycle.is_active())
                .cloned()
                .ok_or_else(|| PortError::not_found("Resident", id))
        }

        async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Resident>, PortError> {
            let state = self.state.read().await;
            let mut residents: Vec<Resident> = state
                .residents
                .values()
                .filter(|r| r.lifecycle.is_active() && r.room_id == Some(room_id))
                .cloned()
                .collect();
            residents.sort_by_key(|r| r.bed_number);
            Ok(residents)
        }

        async fn update_resident(&self, resident: &Resident) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let existing = state
                .residents
                .get_mut(&resident.resident_id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Resident", resident.resident_id))?;
            *existing = resident.clone();
            Ok(())
        }

        async fn add_deposit(
            &self,
            id: ResidentId,
            amount: Money,
        ) -> Result<Resident, PortError> {
            let mut state = self.state.write().await;
            let resident = state
                .residents
                .get_mut(&id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Resident", id))?;
            let mut updated = resident.clone();
            updated
                .add_deposit(amount)
                .map_err(|e| PortError::validation(e.to_string()))?;
            *resident = updated.clone();
            Ok(updated)
        }
    }

    #[async_trait]
    impl TransferPort for MockOccupancyAdapter {
        async fn execute(&self, plan: &TransferPlan) -> Result<RoomChangeRecord, PortError> {
            if self.fail_transfers.load(Ordering::SeqCst) {
                return Err(PortError::Timeout {
                    operation: "transfer".to_string(),
                    duration_ms: 5000,
                });
            }

            // One write lock across the whole commit mirrors the SQL
            // transaction: all mutations land together or not at all.
            let mut state = self.state.write().await;

            let occupied: Vec<i16> = state
                .residents
                .values()
                .filter(|r| {
                    r.lifecycle.is_active() && r.room_id == Some(plan.target_room_id)
                })
                .filter_map(|r| r.bed_number)
                .collect();

            let target = state
                .rooms
                .get(&plan.target_room_id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Room", plan.target_room_id))?;
            if !target.has_spare_capacity() {
                return Err(PortError::conflict(format!(
                    "Room {} is at full capacity",
                    target.label()
                )));
            }
            let new_bed = lowest_free_bed(&occupied, target.capacity).ok_or_else(|| {
                PortError::invariant(format!(
                    "No free bed in room {} though occupancy {} < capacity {}",
                    target.label(),
                    target.current_occupancy,
                    target.capacity
                ))
            })?;

            let source = state
                .rooms
                .get(&plan.source_room_id)
                .ok_or_else(|| PortError::not_found("Room", plan.source_room_id))?;
            if source.current_occupancy == 0 {
                return Err(PortError::invariant(format!(
                    "Source room {} has zero occupancy during transfer",
                    source.label()
                )));
            }

            let resident = state
                .residents
                .get(&plan.resident_id)
                .filter(|r| r.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Resident", plan.resident_id))?;
            let mut updated_resident = resident.clone();
            updated_resident
                .relocate(plan.target_room_id, new_bed)
                .map_err(|e| PortError::validation(e.to_string()))?;

            // Commit point: every check passed, apply all mutations
            let source = state.rooms.get_mut(&plan.source_room_id).unwrap();
            source.current_occupancy -= 1;
            source.status = source.derive_status();

            let target = state.rooms.get_mut(&plan.target_room_id).unwrap();
            target.current_occupancy += 1;
            target.status = target.derive_status();

            state
                .residents
                .insert(plan.resident_id, updated_resident);

            let record = plan.completed(new_bed);
            state.changes.push(record.clone());
            Ok(record)
        }

        async fn list_changes(
            &self,
            resident_id: ResidentId,
        ) -> Result<Vec<RoomChangeRecord>, PortError> {
            let state = self.state.read().await;
            let mut changes: Vec<RoomChangeRecord> = state
                .changes
                .iter()
                .filter(|c| c.resident_id == resident_id)
                .cloned()
                .collect();
            changes.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
            Ok(changes)
        }
    }
}
