//! Room repository
//!
//! PostgreSQL adapter for `RoomPort`. The capacity invariant is enforced in
//! the database: occupancy only moves through conditional updates guarded
//! by `current_occupancy < capacity` (or `> 0` on release), and the
//! `(building, floor, room_number)` identity of active rooms is backed by a
//! partial unique index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{DomainPort, Lifecycle, Money, PortError, RoomId};
use domain_occupancy::ports::{RoomPort, RoomQuery};
use domain_occupancy::room::{Building, Room, RoomStatus, RoomType};

use crate::error::DatabaseError;

/// Repository for room records
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    /// Creates a new RoomRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row for a room
#[derive(Debug, Clone, FromRow)]
pub struct RoomRow {
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
    pub lifecycle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = DatabaseError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        let decode = |e: String| DatabaseError::DecodeFailed(e);
        Ok(Room {
            room_id: RoomId::from_uuid(row.room_id),
            building: row
                .building
                .parse::<Building>()
                .map_err(|e| decode(e.to_string()))?,
            floor: row.floor,
            room_number: row.room_number,
            room_type: row
                .room_type
                .parse::<RoomType>()
                .map_err(|e| decode(e.to_string()))?,
            price: Money::inr(row.price),
            capacity: row.capacity,
            current_occupancy: row.current_occupancy,
            amenities: row.amenities,
            status: row
                .status
                .parse::<RoomStatus>()
                .map_err(|e| decode(e.to_string()))?,
            lifecycle: row.lifecycle.parse::<Lifecycle>().map_err(decode)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_ROOM: &str = r#"
    SELECT room_id, building, floor, room_number, room_type, price,
           capacity, current_occupancy, amenities, status, lifecycle,
           created_at, updated_at
    FROM rooms
"#;

impl RoomRepository {
    async fn fetch_room(&self, id: RoomId) -> Result<Room, PortError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "{SELECT_ROOM} WHERE room_id = $1 AND lifecycle = 'active'"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PortError::not_found("Room", id))?;

        Ok(Room::try_from(row).map_err(PortError::from)?)
    }
}

impl DomainPort for RoomRepository {}

#[async_trait]
impl RoomPort for RoomRepository {
    async fn create_room(&self, room: &Room) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            INSERT INTO rooms (
                room_id, building, floor, room_number, room_type, price,
                capacity, current_occupancy, amenities, status, lifecycle,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(room.room_id.as_uuid())
        .bind(room.building.as_str())
        .bind(room.floor)
        .bind(&room.room_number)
        .bind(room.room_type.as_str())
        .bind(room.price.amount())
        .bind(room.capacity)
        .bind(room.current_occupancy)
        .bind(&room.amenities)
        .bind(room.status.as_str())
        .bind(room.lifecycle.as_str())
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await;

        match result.map_err(DatabaseError::from) {
            Ok(_) => Ok(()),
            Err(DatabaseError::DuplicateEntry(_)) => Err(PortError::conflict(format!(
                "Room {} already exists on floor {} of building {}",
                room.room_number, room.floor, room.building
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_room(&self, id: RoomId) -> Result<Room, PortError> {
        self.fetch_room(id).await
    }

    async fn find_by_identity(
        &self,
        building: Building,
        floor: i16,
        room_number: &str,
    ) -> Result<Option<Room>, PortError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "{SELECT_ROOM} WHERE building = $1 AND floor = $2 AND room_number = $3 \
             AND lifecycle = 'active'"
        ))
        .bind(building.as_str())
        .bind(floor)
        .bind(room_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.map(Room::try_from)
            .transpose()
            .map_err(PortError::from)
    }

    async fn list_rooms(&self, query: RoomQuery) -> Result<Vec<Room>, PortError> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "{SELECT_ROOM} \
             WHERE ($1 OR lifecycle = 'active') \
               AND ($2::text IS NULL OR building = $2) \
               AND ($3::text IS NULL OR status = $3) \
             ORDER BY building, floor, room_number"
        ))
        .bind(query.include_archived)
        .bind(query.building.map(|b| b.as_str()))
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| Room::try_from(row).map_err(PortError::from))
            .collect()
    }

    async fn update_room(&self, room: &Room) -> Result<(), PortError> {
        // Occupancy is deliberately absent from the SET list
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET building = $2, floor = $3, room_number = $4, room_type = $5,
                price = $6, capacity = $7, amenities = $8, status = $9,
                updated_at = $10
            WHERE room_id = $1 AND lifecycle = 'active'
              AND capacity >= current_occupancy
            "#,
        )
        .bind(room.room_id.as_uuid())
        .bind(room.building.as_str())
        .bind(room.floor)
        .bind(&room.room_number)
        .bind(room.room_type.as_str())
        .bind(room.price.amount())
        .bind(room.capacity)
        .bind(&room.amenities)
        .bind(room.status.as_str())
        .bind(room.updated_at)
        .execute(&self.pool)
        .await;

        match result.map_err(DatabaseError::from) {
            Ok(done) if done.rows_affected() == 0 => {
                Err(PortError::not_found("Room", room.room_id))
            }
            Ok(_) => Ok(()),
            Err(DatabaseError::DuplicateEntry(_)) => Err(PortError::conflict(format!(
                "Room {} already exists on floor {} of building {}",
                room.room_number, room.floor, room.building
            ))),
            Err(DatabaseError::ConstraintViolation(_)) => Err(PortError::conflict(
                "Capacity cannot drop below current occupancy".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn archive_room(&self, id: RoomId) -> Result<(), PortError> {
        let done = sqlx::query(
            r#"
            UPDATE rooms
            SET lifecycle = 'archived', updated_at = NOW()
            WHERE room_id = $1 AND lifecycle = 'active' AND current_occupancy = 0
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if done.rows_affected() == 0 {
            // Distinguish an occupied room from a missing one
            let room = self.fetch_room(id).await?;
            return Err(PortError::conflict(format!(
                "Room {} still has {} resident(s)",
                room.label(),
                room.current_occupancy
            )));
        }
        Ok(())
    }

    async fn occupied_beds(&self, id: RoomId) -> Result<Vec<i16>, PortError> {
        let beds: Vec<(i16,)> = sqlx::query_as(
            r#"
            SELECT bed_number FROM residents
            WHERE room_id = $1 AND lifecycle = 'active' AND bed_number IS NOT NULL
            ORDER BY bed_number
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(beds.into_iter().map(|(bed,)| bed).collect())
    }

    async fn reserve_slot(&self, id: RoomId) -> Result<Room, PortError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            UPDATE rooms
            SET current_occupancy = current_occupancy + 1,
                status = CASE
                    WHEN current_occupancy + 1 >= capacity THEN 'full'
                    ELSE status
                END,
                updated_at = NOW()
            WHERE room_id = $1 AND lifecycle = 'active'
              AND status <> 'maintenance'
              AND current_occupancy < capacity
            RETURNING room_id, building, floor, room_number, room_type, price,
                      capacity, current_occupancy, amenities, status, lifecycle,
                      created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        match row {
            Some(row) => Ok(Room::try_from(row).map_err(PortError::from)?),
            None => {
                // The guard failed: report why
                let room = self.fetch_room(id).await?;
                if room.status == RoomStatus::Maintenance {
                    Err(PortError::conflict(format!(
                        "Room {} is under maintenance",
                        room.label()
                    )))
                } else {
                    Err(PortError::conflict(format!(
                        "Room {} is at full capacity",
                        room.label()
                    )))
                }
            }
        }
    }

    async fn release_slot(&self, id: RoomId) -> Result<Room, PortError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            UPDATE rooms
            SET current_occupancy = current_occupancy - 1,
                status = CASE
                    WHEN status = 'full' THEN 'available'
                    ELSE status
                END,
                updated_at = NOW()
            WHERE room_id = $1 AND lifecycle = 'active'
              AND current_occupancy > 0
            RETURNING room_id, building, floor, room_number, room_type, price,
                      capacity, current_occupancy, amenities, status, lifecycle,
                      created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        match row {
            Some(row) => Ok(Room::try_from(row).map_err(PortError::from)?),
            None => {
                let room = self.fetch_room(id).await?;
                Err(PortError::invariant(format!(
                    "Release on empty room {}",
                    room.label()
                )))
            }
        }
    }
}
