//! Room transfer DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_occupancy::RoomChangeRecord;

#[derive(Debug, Deserialize)]
pub struct ExecuteTransferRequest {
    pub resident_id: Uuid,
    pub target_room_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RoomChangeResponse {
    pub room_change_id: Uuid,
    pub resident_id: Uuid,
    pub old_room_id: Uuid,
    pub new_room_id: Uuid,
    pub old_bed_number: i16,
    pub new_bed_number: i16,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl From<RoomChangeRecord> for RoomChangeResponse {
    fn from(record: RoomChangeRecord) -> Self {
        Self {
            room_change_id: *record.room_change_id.as_uuid(),
            resident_id: *record.resident_id.as_uuid(),
            old_room_id: *record.old_room_id.as_uuid(),
            new_room_id: *record.new_room_id.as_uuid(),
            old_bed_number: record.old_bed_number,
            new_bed_number: record.new_bed_number,
            status: record.status.as_str().to_string(),
            requested_at: record.requested_at,
            completed_at: record.completed_at,
        }
    }
}
