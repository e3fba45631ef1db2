//! Room reassignment
//!
//! Moving a resident between rooms is the only operation that must mutate
//! several entities atomically: both occupancy counters, the resident's
//! assignment, and the audit record. The domain side of it is an explicit
//! plan that validates every precondition before any persistence work
//! starts; the adapter commits the plan inside one database transaction or
//! aborts with no partial mutation visible.

use chrono::{DateTime, Utc};
use core_kernel::{ResidentId, RoomChangeId, RoomId};
use serde::{Deserialize, Serialize};

use crate::error::OccupancyError;
use crate::resident::Resident;
use crate::room::Room;

/// Status of a room change record
///
/// Only committed transfers are recorded; an aborted transaction leaves no
/// trace beyond its error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Completed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Completed => "Completed",
        }
    }
}

/// Append-only audit row for a completed room change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomChangeRecord {
    pub room_change_id: RoomChangeId,
    pub resident_id: ResidentId,
    pub old_room_id: RoomId,
    pub new_room_id: RoomId,
    pub old_bed_number: i16,
    pub new_bed_number: i16,
    pub status: TransferStatus,
    pub requested_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// A validated transfer, ready to be committed atomically
///
/// Construction is the Validate step of the
/// Validate → Reserve → Commit | Abort state machine. Holding a plan means
/// every precondition held at validation time; the adapter re-checks the
/// conditional parts (capacity, bed ordinal) under transaction isolation,
/// because another writer may have moved first.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub resident_id: ResidentId,
    pub source_room_id: RoomId,
    pub target_room_id: RoomId,
    pub old_bed_number: i16,
    pub requested_at: DateTime<Utc>,
}

impl TransferPlan {
    /// Validates transfer preconditions and produces a plan
    ///
    /// # Errors
    ///
    /// - `ResidentUnassigned` if the resident holds no room
    /// - `SameRoom` if source and target are the same room
    /// - `RoomUnavailable` if the target is archived or under maintenance
    /// - `RoomAtCapacity` if the target has no spare capacity
    pub fn validate(
        resident: &Resident,
        target: &Room,
    ) -> Result<Self, OccupancyError> {
        let (source_room_id, old_bed_number) = match (resident.room_id, resident.bed_number) {
            (Some(room_id), Some(bed)) => (room_id, bed),
            _ => {
                return Err(OccupancyError::ResidentUnassigned(
                    resident.resident_id.to_string(),
                ))
            }
        };

        if source_room_id == target.room_id {
            return Err(OccupancyError::SameRoom(target.label()));
        }
        if !target.lifecycle.is_active()
            || target.status == crate::room::RoomStatus::Maintenance
        {
            return Err(OccupancyError::RoomUnavailable(target.label()));
        }
        if !target.has_spare_capacity() {
            return Err(OccupancyError::RoomAtCapacity(target.label()));
        }

        Ok(Self {
            resident_id: resident.resident_id,
            source_room_id,
            target_room_id: target.room_id,
            old_bed_number,
            requested_at: Utc::now(),
        })
    }

    /// Builds the audit record for a committed plan
    pub fn completed(&self, new_bed_number: i16) -> RoomChangeRecord {
        RoomChangeRecord {
            room_change_id: RoomChangeId::new_v7(),
            resident_id: self.resident_id,
            old_room_id: self.source_room_id,
            new_room_id: self.target_room_id,
            old_bed_number: self.old_bed_number,
            new_bed_number,
            status: TransferStatus::Completed,
            requested_at: self.requested_at,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Building, NewRoom, RoomType};
    use core_kernel::Money;
    use rust_decimal_macros::dec;

    fn room(building: Building, number: &str, capacity: i16, occupancy: i16) -> Room {
        let mut room = Room::new(NewRoom {
            building,
            floor: 2,
            room_number: number.to_string(),
            room_type: RoomType::Double,
            price: Money::inr(dec!(9500)),
            capacity,
            amenities: vec![],
        })
        .unwrap();
        room.current_occupancy = occupancy;
        room.status = room.derive_status();
        room
    }

    fn assigned_resident(room_id: RoomId, bed: i16) -> Resident {
        let mut resident = Resident::new("Asha Verma", "asha@example.com");
        resident.assign(room_id, bed).unwrap();
        resident
    }

    #[test]
    fn test_validate_produces_plan() {
        let source = room(Building::A, "101", 2, 2);
        let target = room(Building::B, "204", 3, 1);
        let resident = assigned_resident(source.room_id, 2);

        let plan = TransferPlan::validate(&resident, &target).unwrap();
        assert_eq!(plan.source_room_id, source.room_id);
        assert_eq!(plan.target_room_id, target.room_id);
        assert_eq!(plan.old_bed_number, 2);
    }

    #[test]
    fn test_validate_rejects_unassigned_resident() {
        let target = room(Building::B, "204", 3, 1);
        let resident = Resident::new("Asha Verma", "asha@example.com");

        assert!(matches!(
            TransferPlan::validate(&resident, &target),
            Err(OccupancyError::ResidentUnassigned(_))
        ));
    }

    #[test]
    fn test_validate_rejects_same_room() {
        let target = room(Building::B, "204", 3, 1);
        let resident = assigned_resident(target.room_id, 1);

        assert!(matches!(
            TransferPlan::validate(&resident, &target),
            Err(OccupancyError::SameRoom(_))
        ));
    }

    #[test]
    fn test_validate_rejects_full_target() {
        let source = room(Building::A, "101", 2, 1);
        let target = room(Building::B, "204", 2, 2);
        let resident = assigned_resident(source.room_id, 1);

        assert!(matches!(
            TransferPlan::validate(&resident, &target),
            Err(OccupancyError::RoomAtCapacity(_))
        ));
    }

    #[test]
    fn test_completed_record_carries_both_sides() {
        let source = room(Building::A, "101", 2, 2);
        let target = room(Building::B, "204", 3, 1);
        let resident = assigned_resident(source.room_id, 2);

        let plan = TransferPlan::validate(&resident, &target).unwrap();
        let record = plan.completed(1);

        assert_eq!(record.old_room_id, source.room_id);
        assert_eq!(record.new_room_id, target.room_id);
        assert_eq!(record.old_bed_number, 2);
        assert_eq!(record.new_bed_number, 1);
        assert_eq!(record.status, TransferStatus::Completed);
        assert!(record.completed_at >= record.requested_at);
    }
}
