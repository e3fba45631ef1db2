//! Occupancy domain services
//!
//! Services orchestrate the ports: validation happens in the domain types,
//! every invariant-bearing write goes through an atomic port operation, and
//! notifications are emitted only after the write has committed.

use chrono::{NaiveDate, Utc};
use core_kernel::{NotifierPort, PortError, ResidentId, RoomId};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::OccupancyError;
use crate::events::OccupancyEvent;
use crate::ports::{ResidentPort, RoomPort, RoomQuery, TransferPort};
use crate::resident::Resident;
use crate::room::{lowest_free_bed, NewRoom, Room, RoomUpdate};
use crate::transfer::{RoomChangeRecord, TransferPlan};

/// Slim resident view embedded in room listings
#[derive(Debug, Clone, Serialize)]
pub struct ResidentSummary {
    pub resident_id: ResidentId,
    pub name: String,
    pub bed_number: Option<i16>,
}

impl From<&Resident> for ResidentSummary {
    fn from(resident: &Resident) -> Self {
        Self {
            resident_id: resident.resident_id,
            name: resident.name.clone(),
            bed_number: resident.bed_number,
        }
    }
}

/// A room together with its current residents
#[derive(Debug, Clone, Serialize)]
pub struct RoomWithResidents {
    #[serde(flatten)]
    pub room: Room,
    pub residents: Vec<ResidentSummary>,
}

/// Service over the room directory and bed allocator
pub struct RoomDirectoryService {
    rooms: Arc<dyn RoomPort>,
    residents: Arc<dyn ResidentPort>,
}

impl RoomDirectoryService {
    /// Creates the service over its ports
    pub fn new(rooms: Arc<dyn RoomPort>, residents: Arc<dyn ResidentPort>) -> Self {
        Self { rooms, residents }
    }

    /// Creates a room after validating the identity key is free
    ///
    /// The repository's uniqueness constraint is the authoritative check;
    /// the lookup here only exists to produce a friendly message first.
    pub async fn create_room(&self, input: NewRoom) -> Result<Room, OccupancyError> {
        let room = Room::new(input)?;

        if let Some(existing) = self
            .rooms
            .find_by_identity(room.building, room.floor, &room.room_number)
            .await?
        {
            return Err(OccupancyError::IdentityCollision(
                existing.room_number,
                existing.building.to_string(),
                existing.floor,
            ));
        }

        self.rooms.create_room(&room).await?;
        Ok(room)
    }

    /// Applies a partial update to a room
    pub async fn update_room(
        &self,
        id: RoomId,
        update: RoomUpdate,
    ) -> Result<Room, OccupancyError> {
        let mut room = self.rooms.get_room(id).await?;
        room.apply_update(update)?;

        if let Some(other) = self
            .rooms
            .find_by_identity(room.building, room.floor, &room.room_number)
            .await?
        {
            if other.room_id != room.room_id {
                return Err(OccupancyError::IdentityCollision(
                    other.room_number,
                    other.building.to_string(),
                    other.floor,
                ));
            }
        }

        self.rooms.update_room(&room).await?;
        Ok(room)
    }

    /// Archives a room; only permitted while nobody lives in it
    pub async fn delete_room(&self, id: RoomId) -> Result<(), OccupancyError> {
        // The conditional archive is the authoritative occupancy check
        self.rooms.archive_room(id).await?;
        Ok(())
    }

    /// Lists rooms, optionally with their resident summaries
    pub async fn list_rooms(
        &self,
        query: RoomQuery,
        with_residents: bool,
    ) -> Result<Vec<RoomWithResidents>, OccupancyError> {
        let rooms = self.rooms.list_rooms(query).await?;
        let mut result = Vec::with_capacity(rooms.len());

        for room in rooms {
            let residents = if with_residents {
                self.residents
                    .list_by_room(room.room_id)
                    .await?
                    .iter()
                    .map(ResidentSummary::from)
                    .collect()
            } else {
                Vec::new()
            };
            result.push(RoomWithResidents { room, residents });
        }

        Ok(result)
    }

    /// Assigns the lowest free bed of a room to an unassigned resident
    ///
    /// Reserve-then-bind: capacity is claimed with an atomic conditional
    /// increment first, so a concurrent assignment can never overshoot
    /// capacity; the slot is released again if the binding fails.
    pub async fn assign_resident(
        &self,
        resident_id: ResidentId,
        room_id: RoomId,
    ) -> Result<Resident, OccupancyError> {
        let mut resident = self.residents.get_resident(resident_id).await?;
        if resident.is_assigned() {
            return Err(OccupancyError::ResidentAlreadyAssigned(
                resident_id.to_string(),
            ));
        }

        let room = self.rooms.reserve_slot(room_id).await?;

        let bed = match self.find_bed(&room).await {
            Ok(bed) => bed,
            Err(e) => {
                self.rollback_slot(room_id).await;
                return Err(e);
            }
        };

        resident.assign(room.room_id, bed)?;
        if let Err(e) = self.residents.update_resident(&resident).await {
            self.rollback_slot(room_id).await;
            return Err(e.into());
        }

        Ok(resident)
    }

    /// Vacates a resident's bed, stamping the last staying date
    pub async fn vacate_resident(
        &self,
        resident_id: ResidentId,
        last_staying_date: NaiveDate,
    ) -> Result<Resident, OccupancyError> {
        let mut resident = self.residents.get_resident(resident_id).await?;
        let room_id = resident
            .room_id
            .ok_or_else(|| OccupancyError::ResidentUnassigned(resident_id.to_string()))?;

        resident.vacate(last_staying_date)?;
        self.residents.update_resident(&resident).await?;
        self.rooms.release_slot(room_id).await?;

        Ok(resident)
    }

    async fn find_bed(&self, room: &Room) -> Result<i16, OccupancyError> {
        let occupied = self.rooms.occupied_beds(room.room_id).await?;
        lowest_free_bed(&occupied, room.capacity).ok_or_else(|| {
            // Unreachable while the occupancy invariant holds; the reserve
            // already proved occupancy < capacity.
            PortError::invariant(format!(
                "No free bed in room {} though occupancy {} <= capacity {}",
                room.label(),
                room.current_occupancy,
                room.capacity
            ))
            .into()
        })
    }

    async fn rollback_slot(&self, room_id: RoomId) {
        if let Err(e) = self.rooms.release_slot(room_id).await {
            warn!(room_id = %room_id, error = %e, "failed to release reserved slot");
        }
    }
}

/// Service executing the room reassignment transaction
pub struct TransferService {
    rooms: Arc<dyn RoomPort>,
    residents: Arc<dyn ResidentPort>,
    transfers: Arc<dyn TransferPort>,
    notifier: Arc<dyn NotifierPort>,
}

impl TransferService {
    /// Creates the service over its ports
    pub fn new(
        rooms: Arc<dyn RoomPort>,
        residents: Arc<dyn ResidentPort>,
        transfers: Arc<dyn TransferPort>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        Self {
            rooms,
            residents,
            transfers,
            notifier,
        }
    }

    /// Moves a resident to a different room
    ///
    /// Validate → Reserve → Commit | Abort: preconditions are checked
    /// against current state, then the whole move commits in one
    /// transaction at the port. Notifications go out only after the commit
    /// and are best-effort; a failed emit is logged, never propagated.
    pub async fn execute(
        &self,
        resident_id: ResidentId,
        target_room_id: RoomId,
    ) -> Result<RoomChangeRecord, OccupancyError> {
        let resident = self.residents.get_resident(resident_id).await?;
        let target = self.rooms.get_room(target_room_id).await?;

        let plan = TransferPlan::validate(&resident, &target)?;
        let source = self.rooms.get_room(plan.source_room_id).await?;

        let record = self.transfers.execute(&plan).await?;

        let event = OccupancyEvent::RoomChanged {
            resident_id,
            resident_name: resident.name.clone(),
            old_room_label: source.label(),
            new_room_label: target.label(),
            old_bed_number: record.old_bed_number,
            new_bed_number: record.new_bed_number,
            timestamp: Utc::now(),
        };
        for notification in event.notifications() {
            if let Err(e) = self.notifier.notify(notification).await {
                warn!(error = %e, "room change notification failed");
            }
        }

        Ok(record)
    }

    /// Room change history for a resident
    pub async fn history(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<RoomChangeRecord>, OccupancyError> {
        Ok(self.transfers.list_changes(resident_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockOccupancyAdapter;
    use crate::room::{Building, RoomType};
    use core_kernel::notification::mock::RecordingNotifier;
    use core_kernel::Money;
    use rust_decimal_macros::dec;

    fn new_room(building: Building, number: &str, capacity: i16) -> NewRoom {
        NewRoom {
            building,
            floor: 2,
            room_number: number.to_string(),
            room_type: RoomType::Double,
            price: Money::inr(dec!(9500)),
            capacity,
            amenities: vec![],
        }
    }

    fn directory(adapter: &MockOccupancyAdapter) -> RoomDirectoryService {
        RoomDirectoryService::new(Arc::new(adapter.clone()), Arc::new(adapter.clone()))
    }

    fn transfer_service(
        adapter: &MockOccupancyAdapter,
        notifier: &RecordingNotifier,
    ) -> TransferService {
        TransferService::new(
            Arc::new(adapter.clone()),
            Arc::new(adapter.clone()),
            Arc::new(adapter.clone()),
            Arc::new(notifier.clone()),
        )
    }

    #[tokio::test]
    async fn test_create_room_rejects_identity_collision() {
        let adapter = MockOccupancyAdapter::new();
        let service = directory(&adapter);

        service
            .create_room(new_room(Building::A, "302", 2))
            .await
            .unwrap();
        let err = service
            .create_room(new_room(Building::A, "302", 3))
            .await
            .unwrap_err();

        assert!(matches!(err, OccupancyError::IdentityCollision(_, _, _)));
    }

    #[tokio::test]
    async fn test_assignment_fills_lowest_bed_and_respects_capacity() {
        let adapter = MockOccupancyAdapter::new();
        let service = directory(&adapter);

        let room = service
            .create_room(new_room(Building::A, "101", 2))
            .await
            .unwrap();

        let a = Resident::new("A", "a@example.com");
        let b = Resident::new("B", "b@example.com");
        let c = Resident::new("C", "c@example.com");
        for r in [&a, &b, &c] {
            adapter.seed_resident(r.clone()).await;
        }

        let a = service
            .assign_resident(a.resident_id, room.room_id)
            .await
            .unwrap();
        assert_eq!(a.bed_number, Some(1));

        let b = service
            .assign_resident(b.resident_id, room.room_id)
            .await
            .unwrap();
        assert_eq!(b.bed_number, Some(2));

        let err = service
            .assign_resident(c.resident_id, room.room_id)
            .await
            .unwrap_err();
        assert!(matches!(err, OccupancyError::Port(e) if e.is_conflict()));

        let snapshot = adapter.room_snapshot(room.room_id).await.unwrap();
        assert_eq!(snapshot.current_occupancy, 2);
    }

    #[tokio::test]
    async fn test_vacate_releases_bed_and_occupancy() {
        let adapter = MockOccupancyAdapter::new();
        let service = directory(&adapter);

        let room = service
            .create_room(new_room(Building::A, "101", 2))
            .await
            .unwrap();
        let resident = Resident::new("A", "a@example.com");
        adapter.seed_resident(resident.clone()).await;

        service
            .assign_resident(resident.resident_id, room.room_id)
            .await
            .unwrap();

        let leave = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        let vacated = service
            .vacate_resident(resident.resident_id, leave)
            .await
            .unwrap();

        assert!(!vacated.is_assigned());
        assert_eq!(vacated.last_staying_date, Some(leave));
        let snapshot = adapter.room_snapshot(room.room_id).await.unwrap();
        assert_eq!(snapshot.current_occupancy, 0);
    }

    #[tokio::test]
    async fn test_delete_room_requires_zero_occupancy() {
        let adapter = MockOccupancyAdapter::new();
        let service = directory(&adapter);

        let room = service
            .create_room(new_room(Building::A, "101", 2))
            .await
            .unwrap();
        let resident = Resident::new("A", "a@example.com");
        adapter.seed_resident(resident.clone()).await;
        service
            .assign_resident(resident.resident_id, room.room_id)
            .await
            .unwrap();

        let err = service.delete_room(room.room_id).await.unwrap_err();
        assert!(matches!(err, OccupancyError::Port(e) if e.is_conflict()));

        let leave = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        service
            .vacate_resident(resident.resident_id, leave)
            .await
            .unwrap();
        service.delete_room(room.room_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_transfer_moves_resident_and_notifies_both_audiences() {
        let adapter = MockOccupancyAdapter::new();
        let notifier = RecordingNotifier::new();
        let dir = directory(&adapter);
        let transfers = transfer_service(&adapter, &notifier);

        let source = dir
            .create_room(new_room(Building::A, "101", 2))
            .await
            .unwrap();
        let target = dir
            .create_room(new_room(Building::B, "204", 3))
            .await
            .unwrap();

        let mover = Resident::new("Mover", "mover@example.com");
        let sitter = Resident::new("Sitter", "sitter@example.com");
        adapter.seed_resident(mover.clone()).await;
        adapter.seed_resident(sitter.clone()).await;

        dir.assign_resident(mover.resident_id, source.room_id)
            .await
            .unwrap();
        dir.assign_resident(sitter.resident_id, source.room_id)
            .await
            .unwrap();
        // Target has one existing occupant on bed 1
        let other = Resident::new("Other", "other@example.com");
        adapter.seed_resident(other.clone()).await;
        dir.assign_resident(other.resident_id, target.room_id)
            .await
            .unwrap();

        let record = transfers
            .execute(mover.resident_id, target.room_id)
            .await
            .unwrap();

        assert_eq!(record.old_room_id, source.room_id);
        assert_eq!(record.new_room_id, target.room_id);
        assert_eq!(record.new_bed_number, 2);

        let src = adapter.room_snapshot(source.room_id).await.unwrap();
        let tgt = adapter.room_snapshot(target.room_id).await.unwrap();
        assert_eq!(src.current_occupancy, 1);
        assert_eq!(tgt.current_occupancy, 2);

        let moved = adapter.resident_snapshot(mover.resident_id).await.unwrap();
        assert_eq!(moved.room_id, Some(target.room_id));
        assert_eq!(moved.bed_number, Some(2));

        let recorded = notifier.recorded().await;
        assert_eq!(recorded.len(), 2);
    }

    #[tokio::test]
    async fn test_aborted_transfer_leaves_no_partial_mutation() {
        let adapter = MockOccupancyAdapter::new();
        let notifier = RecordingNotifier::new();
        let dir = directory(&adapter);
        let transfers = transfer_service(&adapter, &notifier);

        let source = dir
            .create_room(new_room(Building::A, "101", 2))
            .await
            .unwrap();
        let target = dir
            .create_room(new_room(Building::B, "204", 3))
            .await
            .unwrap();
        let mover = Resident::new("Mover", "mover@example.com");
        adapter.seed_resident(mover.clone()).await;
        dir.assign_resident(mover.resident_id, source.room_id)
            .await
            .unwrap();

        adapter.poison_transfers();
        let err = transfers
            .execute(mover.resident_id, target.room_id)
            .await
            .unwrap_err();
        assert!(err.is_transient());

        // Nothing moved
        let src = adapter.room_snapshot(source.room_id).await.unwrap();
        let tgt = adapter.room_snapshot(target.room_id).await.unwrap();
        assert_eq!(src.current_occupancy, 1);
        assert_eq!(tgt.current_occupancy, 0);
        let resident = adapter.resident_snapshot(mover.resident_id).await.unwrap();
        assert_eq!(resident.room_id, Some(source.room_id));
        assert!(notifier.recorded().await.is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_transfer() {
        let adapter = MockOccupancyAdapter::new();
        let notifier = RecordingNotifier::failing();
        let dir = directory(&adapter);
        let transfers = transfer_service(&adapter, &notifier);

        let source = dir
            .create_room(new_room(Building::A, "101", 1))
            .await
            .unwrap();
        let target = dir
            .create_room(new_room(Building::B, "204", 1))
            .await
            .unwrap();
        let mover = Resident::new("Mover", "mover@example.com");
        adapter.seed_resident(mover.clone()).await;
        dir.assign_resident(mover.resident_id, source.room_id)
            .await
            .unwrap();

        // The commit stands even though both emits fail
        let record = transfers
            .execute(mover.resident_id, target.room_id)
            .await
            .unwrap();
        assert_eq!(record.new_bed_number, 1);
    }

    #[tokio::test]
    async fn test_list_rooms_with_residents() {
        let adapter = MockOccupancyAdapter::new();
        let service = directory(&adapter);

        let room = service
            .create_room(new_room(Building::A, "101", 2))
            .await
            .unwrap();
        let resident = Resident::new("A", "a@example.com");
        adapter.seed_resident(resident.clone()).await;
        service
            .assign_resident(resident.resident_id, room.room_id)
            .await
            .unwrap();

        let listing = service
            .list_rooms(RoomQuery::default(), true)
            .await
            .unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].residents.len(), 1);
        assert_eq!(listing[0].residents[0].bed_number, Some(1));
    }
}
