//! Room aggregate and bed allocation
//!
//! A room is identified to humans by `(building, floor, room_number)` and
//! holds `capacity` beds numbered `1..=capacity`. Occupancy is tracked as a
//! counter on the room itself; the persistence layer only ever changes it
//! through conditional updates, so the capacity invariant survives
//! concurrent writers.

use chrono::{DateTime, Utc};
use core_kernel::{Lifecycle, Money, RoomId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OccupancyError;

/// Buildings of the facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Building {
    A,
    B,
}

impl Building {
    pub fn as_str(&self) -> &'static str {
        match self {
            Building::A => "A",
            Building::B => "B",
        }
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Building {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Building::A),
            "B" => Ok(Building::B),
            other => Err(OccupancyError::validation(format!(
                "Unknown building '{}': expected A or B",
                other
            ))),
        }
    }
}

/// Room sharing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Single,
    Double,
    Triple,
    Shared,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Single => "single",
            RoomType::Double => "double",
            RoomType::Triple => "triple",
            RoomType::Shared => "shared",
        }
    }
}

impl FromStr for RoomType {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(RoomType::Single),
            "double" => Ok(RoomType::Double),
            "triple" => Ok(RoomType::Triple),
            "shared" => Ok(RoomType::Shared),
            other => Err(OccupancyError::validation(format!(
                "Unknown room type '{}'",
                other
            ))),
        }
    }
}

/// Operational status, derived from occupancy unless set to Maintenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Full,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Full => "full",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

impl FromStr for RoomStatus {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(RoomStatus::Available),
            "full" => Ok(RoomStatus::Full),
            "maintenance" => Ok(RoomStatus::Maintenance),
            other => Err(OccupancyError::validation(format!(
                "Unknown room status '{}'",
                other
            ))),
        }
    }
}

/// Floors run 1..=6 in both buildings
pub const MIN_FLOOR: i16 = 1;
pub const MAX_FLOOR: i16 = 6;

/// A room record
///
/// # Invariants
///
/// - `0 <= current_occupancy <= capacity`
/// - `(building, floor, room_number)` is unique among Active rooms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub building: Building,
    pub floor: i16,
    pub room_number: String,
    pub room_type: RoomType,
    /// Monthly rent; the room price every due derivation starts from
    pub price: Money,
    pub capacity: i16,
    pub current_occupancy: i16,
    pub amenities: Vec<String>,
    pub status: RoomStatus,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a room
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub building: Building,
    pub floor: i16,
    pub room_number: String,
    pub room_type: RoomType,
    pub price: Money,
    pub capacity: i16,
    pub amenities: Vec<String>,
}

/// Partial update for a room; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct RoomUpdate {
    pub building: Option<Building>,
    pub floor: Option<i16>,
    pub room_number: Option<String>,
    pub room_type: Option<RoomType>,
    pub price: Option<Money>,
    pub capacity: Option<i16>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<RoomStatus>,
}

impl Room {
    /// Creates a new room with occupancy zero
    ///
    /// # Errors
    ///
    /// Returns `OccupancyError::Validation` for a floor outside 1..=6,
    /// a non-positive capacity, a non-positive price, or an empty room
    /// number. The identity-collision check happens at the repository.
    pub fn new(input: NewRoom) -> Result<Self, OccupancyError> {
        if !(MIN_FLOOR..=MAX_FLOOR).contains(&input.floor) {
            return Err(OccupancyError::validation(format!(
                "Floor {} is outside {}..={}",
                input.floor, MIN_FLOOR, MAX_FLOOR
            )));
        }
        if input.capacity <= 0 {
            return Err(OccupancyError::validation("Capacity must be positive"));
        }
        if !input.price.is_positive() {
            return Err(OccupancyError::validation("Price must be positive"));
        }
        if input.room_number.trim().is_empty() {
            return Err(OccupancyError::validation("Room number is required"));
        }

        let now = Utc::now();
        Ok(Self {
            room_id: RoomId::new_v7(),
            building: input.building,
            floor: input.floor,
            room_number: input.room_number,
            room_type: input.room_type,
            price: input.price,
            capacity: input.capacity,
            current_occupancy: 0,
            amenities: input.amenities,
            status: RoomStatus::Available,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Human-readable room label, e.g. `A-302`
    pub fn label(&self) -> String {
        format!("{}-{}", self.building, self.room_number)
    }

    /// The `(building, floor, room_number)` identity key
    pub fn identity_key(&self) -> (Building, i16, &str) {
        (self.building, self.floor, &self.room_number)
    }

    /// Returns true when another resident can be assigned
    pub fn has_spare_capacity(&self) -> bool {
        self.current_occupancy < self.capacity
    }

    /// Returns true when the room accepts new assignments
    pub fn accepts_assignments(&self) -> bool {
        self.lifecycle.is_active()
            && self.status != RoomStatus::Maintenance
            && self.has_spare_capacity()
    }

    /// Applies a partial update, re-validating every touched invariant
    ///
    /// Occupancy is never writable through an update; it only moves through
    /// assignment and vacancy.
    pub fn apply_update(&mut self, update: RoomUpdate) -> Result<(), OccupancyError> {
        if let Some(floor) = update.floor {
            if !(MIN_FLOOR..=MAX_FLOOR).contains(&floor) {
                return Err(OccupancyError::validation(format!(
                    "Floor {} is outside {}..={}",
                    floor, MIN_FLOOR, MAX_FLOOR
                )));
            }
            self.floor = floor;
        }
        if let Some(capacity) = update.capacity {
            if capacity <= 0 {
                return Err(OccupancyError::validation("Capacity must be positive"));
            }
            if capacity < self.current_occupancy {
                return Err(OccupancyError::CapacityBelowOccupancy {
                    requested: capacity,
                    occupancy: self.current_occupancy,
                });
            }
            self.capacity = capacity;
        }
        if let Some(price) = update.price {
            if !price.is_positive() {
                return Err(OccupancyError::validation("Price must be positive"));
            }
            self.price = price;
        }
        if let Some(room_number) = update.room_number {
            if room_number.trim().is_empty() {
                return Err(OccupancyError::validation("Room number is required"));
            }
            self.room_number = room_number;
        }
        if let Some(building) = update.building {
            self.building = building;
        }
        if let Some(room_type) = update.room_type {
            self.room_type = room_type;
        }
        if let Some(amenities) = update.amenities {
            self.amenities = amenities;
        }
        if let Some(status) = update.status {
            self.status = status;
        }

        self.status = self.derive_status();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Recomputes the operational status from occupancy
    ///
    /// Maintenance is sticky; it is only left through an explicit update.
    pub fn derive_status(&self) -> RoomStatus {
        if self.status == RoomStatus::Maintenance {
            RoomStatus::Maintenance
        } else if self.current_occupancy >= self.capacity {
            RoomStatus::Full
        } else {
            RoomStatus::Available
        }
    }
}

/// Returns the lowest bed ordinal in `1..=capacity` not currently held
///
/// `None` means every bed is taken. The caller decides whether that is a
/// capacity rejection or an invariant violation (occupancy said there was
/// room).
pub fn lowest_free_bed(occupied: &[i16], capacity: i16) -> Option<i16> {
    (1..=capacity).find(|bed| !occupied.contains(bed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_room_input() -> NewRoom {
        NewRoom {
            building: Building::A,
            floor: 3,
            room_number: "302".to_string(),
            room_type: RoomType::Double,
            price: Money::inr(dec!(9500)),
            capacity: 2,
            amenities: vec!["wifi".to_string()],
        }
    }

    #[test]
    fn test_room_creation_defaults() {
        let room = Room::new(new_room_input()).unwrap();
        assert_eq!(room.current_occupancy, 0);
        assert_eq!(room.status, RoomStatus::Available);
        assert!(room.lifecycle.is_active());
        assert_eq!(room.label(), "A-302");
    }

    #[test]
    fn test_room_rejects_bad_floor() {
        let mut input = new_room_input();
        input.floor = 7;
        assert!(matches!(
            Room::new(input),
            Err(OccupancyError::Validation(_))
        ));
    }

    #[test]
    fn test_room_rejects_nonpositive_capacity_and_price() {
        let mut input = new_room_input();
        input.capacity = 0;
        assert!(Room::new(input).is_err());

        let mut input = new_room_input();
        input.price = Money::inr(dec!(0));
        assert!(Room::new(input).is_err());
    }

    #[test]
    fn test_capacity_cannot_drop_below_occupancy() {
        let mut room = Room::new(new_room_input()).unwrap();
        room.current_occupancy = 2;

        let err = room
            .apply_update(RoomUpdate {
                capacity: Some(1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            OccupancyError::CapacityBelowOccupancy {
                requested: 1,
                occupancy: 2
            }
        ));
    }

    #[test]
    fn test_status_derivation() {
        let mut room = Room::new(new_room_input()).unwrap();
        assert_eq!(room.derive_status(), RoomStatus::Available);

        room.current_occupancy = 2;
        assert_eq!(room.derive_status(), RoomStatus::Full);

        room.status = RoomStatus::Maintenance;
        assert_eq!(room.derive_status(), RoomStatus::Maintenance);
    }

    #[test]
    fn test_lowest_free_bed() {
        assert_eq!(lowest_free_bed(&[], 2), Some(1));
        assert_eq!(lowest_free_bed(&[1], 2), Some(2));
        assert_eq!(lowest_free_bed(&[2], 2), Some(1));
        assert_eq!(lowest_free_bed(&[1, 2], 2), None);
        // A vacated middle bed is reused first
        assert_eq!(lowest_free_bed(&[1, 3], 3), Some(2));
    }

    #[test]
    fn test_building_parsing() {
        assert_eq!("A".parse::<Building>().unwrap(), Building::A);
        assert!("C".parse::<Building>().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn lowest_free_bed_is_free_and_minimal(
            capacity in 1i16..64,
            occupied in proptest::collection::vec(1i16..64, 0..64)
        ) {
            match lowest_free_bed(&occupied, capacity) {
                Some(bed) => {
                    prop_assert!((1..=capacity).contains(&bed));
                    prop_assert!(!occupied.contains(&bed));
                    // Minimality: every lower ordinal is occupied
                    for lower in 1..bed {
                        prop_assert!(occupied.contains(&lower));
                    }
                }
                None => {
                    for bed in 1..=capacity {
                        prop_assert!(occupied.contains(&bed));
                    }
                }
            }
        }
    }
}
