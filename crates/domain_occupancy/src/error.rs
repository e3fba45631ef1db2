//! Occupancy domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the occupancy domain
#[derive(Debug, Error)]
pub enum OccupancyError {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// An active room with the same (building, floor, room number) exists
    #[error("Room {0} already exists in building {1}, floor {2}")]
    IdentityCollision(String, String, i16),

    /// The room has no free capacity left
    #[error("Room {0} is at full capacity")]
    RoomAtCapacity(String),

    /// Capacity cannot drop below the current occupancy
    #[error("Capacity {requested} is below current occupancy {occupancy}")]
    CapacityBelowOccupancy { requested: i16, occupancy: i16 },

    /// Occupied rooms cannot be archived
    #[error("Room {0} still has {1} resident(s)")]
    RoomOccupied(String, i16),

    /// The resident does not currently hold a room
    #[error("Resident {0} has no room assigned")]
    ResidentUnassigned(String),

    /// The resident already holds a room
    #[error("Resident {0} already has a room assigned")]
    ResidentAlreadyAssigned(String),

    /// Source and target of a transfer must differ
    #[error("Resident is already in room {0}")]
    SameRoom(String),

    /// The target room is not accepting assignments
    #[error("Room {0} is not available")]
    RoomUnavailable(String),

    /// Error from the persistence port
    #[error(transparent)]
    Port(#[from] PortError),
}

impl OccupancyError {
    pub fn validation(message: impl Into<String>) -> Self {
        OccupancyError::Validation(message.into())
    }

    /// Returns true if the error is a transient persistence failure
    pub fn is_transient(&self) -> bool {
        matches!(self, OccupancyError::Port(e) if e.is_transient())
    }
}
