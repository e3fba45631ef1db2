//! Room DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_occupancy::{ResidentSummary, RoomWithResidents};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    pub building: String,
    #[validate(range(min = 1, max = 6))]
    pub floor: i16,
    #[validate(length(min = 1))]
    pub room_number: String,
    pub room_type: String,
    pub price: Decimal,
    #[validate(range(min = 1))]
    pub capacity: i16,
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    pub building: Option<String>,
    #[validate(range(min = 1, max = 6))]
    pub floor: Option<i16>,
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 1))]
    pub capacity: Option<i16>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListRoomsParams {
    #[serde(default)]
    pub with_residents: bool,
    pub building: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResidentSummaryResponse {
    pub resident_id: Uuid,
    pub name: String,
    pub bed_number: Option<i16>,
}

impl From<ResidentSummary> for ResidentSummaryResponse {
    fn from(summary: ResidentSummary) -> Self {
        Self {
            resident_id: *summary.resident_id.as_uuid(),
            name: summary.name,
            bed_number: summary.bed_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub room_id: Uuid,
    pub building: String,
    pub floor: i16,
    pub room_number: String,
    pub room_type: String,
    pub price: Decimal,
    pub capacity: i16,
    pub current_occupancy: i16,
    pub amenities: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residents: Option<Vec<ResidentSummaryResponse>>,
}

impl From<domain_occupancy::Room> for RoomResponse {
    fn from(room: domain_occupancy::Room) -> Self {
        Self {
            room_id: *room.room_id.as_uuid(),
            building: room.building.to_string(),
            floor: room.floor,
            room_number: room.room_number,
            room_type: room.room_type.as_str().to_string(),
            price: room.price.amount(),
            capacity: room.capacity,
            current_occupancy: room.current_occupancy,
            amenities: room.amenities,
            status: room.status.as_str().to_string(),
            created_at: room.created_at,
            updated_at: room.updated_at,
            residents: None,
        }
    }
}

impl RoomResponse {
    /// Builds the response from a listing row, embedding residents when asked
    pub fn from_listing(listing: RoomWithResidents, with_residents: bool) -> Self {
        let residents = with_residents.then(|| {
            listing
                .residents
                .into_iter()
                .map(ResidentSummaryResponse::from)
                .collect()
        });
        let mut response = Self::from(listing.room);
        response.residents = residents;
        response
    }
}
