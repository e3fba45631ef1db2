//! Domain events for the occupancy aggregate
//!
//! Occupancy events capture significant state changes and are the source
//! for the best-effort notifications emitted after a commit.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{NotificationEvent, NotificationType, ResidentId, RoomId};
use serde::{Deserialize, Serialize};

/// Domain events emitted by occupancy operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OccupancyEvent {
    /// A resident was assigned their first bed
    ResidentAssigned {
        resident_id: ResidentId,
        room_id: RoomId,
        bed_number: i16,
        timestamp: DateTime<Utc>,
    },

    /// A resident moved between rooms
    RoomChanged {
        resident_id: ResidentId,
        resident_name: String,
        old_room_label: String,
        new_room_label: String,
        old_bed_number: i16,
        new_bed_number: i16,
        timestamp: DateTime<Utc>,
    },

    /// A resident left their room
    ResidentVacated {
        resident_id: ResidentId,
        room_id: RoomId,
        last_staying_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
}

impl OccupancyEvent {
    /// Builds the best-effort notifications for this event
    ///
    /// A room change addresses both the admins and the affected resident;
    /// the other events address the admins only.
    pub fn notifications(&self) -> Vec<NotificationEvent> {
        match self {
            OccupancyEvent::RoomChanged {
                resident_id,
                resident_name,
                old_room_label,
                new_room_label,
                new_bed_number,
                ..
            } => vec![
                NotificationEvent::for_admins(
                    "Room change completed",
                    format!(
                        "{} moved from room {} to room {}",
                        resident_name, old_room_label, new_room_label
                    ),
                    NotificationType::RoomChange,
                )
                .with_related(*resident_id.as_uuid()),
                NotificationEvent::for_resident(
                    *resident_id.as_uuid(),
                    "Your room has changed",
                    format!(
                        "You have been moved to room {}, bed {}",
                        new_room_label, new_bed_number
                    ),
                    NotificationType::RoomChange,
                ),
            ],
            OccupancyEvent::ResidentAssigned {
                resident_id,
                room_id,
                bed_number,
                ..
            } => vec![NotificationEvent::for_admins(
                "Bed assigned",
                format!(
                    "Resident {} assigned to room {}, bed {}",
                    resident_id, room_id, bed_number
                ),
                NotificationType::General,
            )
            .with_related(*resident_id.as_uuid())],
            OccupancyEvent::ResidentVacated {
                resident_id,
                room_id,
                last_staying_date,
                ..
            } => vec![NotificationEvent::for_admins(
                "Room vacated",
                format!(
                    "Resident {} left room {} (last staying date {})",
                    resident_id, room_id, last_staying_date
                ),
                NotificationType::General,
            )
            .with_related(*resident_id.as_uuid())],
        }
    }
}
