//! Transfer repository
//!
//! PostgreSQL adapter for `TransferPort`. The room reassignment is the one
//! multi-document transaction in the system: both occupancy counters, the
//! resident's assignment, and the audit row commit together or not at all.
//! A deadlock or serialization abort maps to a transient error; a retry
//! re-validates from current state and is safe.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{DomainPort, PortError, ResidentId, RoomChangeId, RoomId};
use domain_occupancy::ports::TransferPort;
use domain_occupancy::room::lowest_free_bed;
use domain_occupancy::transfer::{RoomChangeRecord, TransferPlan, TransferStatus};

use crate::error::DatabaseError;

/// Repository executing room reassignments
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    /// Creates a new TransferRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row for a room change record
#[derive(Debug, Clone, FromRow)]
pub struct RoomChangeRow {
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

impl TryFrom<RoomChangeRow> for RoomChangeRecord {
    type Error = DatabaseError;

    fn try_from(row: RoomChangeRow) -> Result<Self, Self::Error> {
        if row.status != "Completed" {
            return Err(DatabaseError::DecodeFailed(format!(
                "unknown room change status '{}'",
                row.status
            )));
        }
        Ok(RoomChangeRecord {
            room_change_id: RoomChangeId::from_uuid(row.room_change_id),
            resident_id: ResidentId::from_uuid(row.resident_id),
            old_room_id: RoomId::from_uuid(row.old_room_id),
            new_room_id: RoomId::from_uuid(row.new_room_id),
            old_bed_number: row.old_bed_number,
            new_bed_number: row.new_bed_number,
            status: TransferStatus::Completed,
            requested_at: row.requested_at,
            completed_at: row.completed_at,
        })
    }
}

impl DomainPort for TransferRepository {}

#[async_trait]
impl TransferPort for TransferRepository {
    async fn execute(&self, plan: &TransferPlan) -> Result<RoomChangeRecord, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        // Lock the target room row for the whole commit. Opposite-direction
        // transfers can deadlock on the two room rows; Postgres aborts one,
        // which surfaces as a transient, retryable error.
        let target: Option<(i16, i16, String, String)> = sqlx::query_as(
            r#"
            SELECT capacity, current_occupancy, status, lifecycle
            FROM rooms WHERE room_id = $1
            FOR UPDATE
            "#,
        )
        .bind(plan.target_room_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        let (capacity, occupancy, status, lifecycle) = target
            .ok_or_else(|| PortError::not_found("Room", plan.target_room_id))?;
        if lifecycle != "active" || status == "maintenance" {
            return Err(PortError::conflict("Target room is not available"));
        }
        if occupancy >= capacity {
            return Err(PortError::conflict("Target room is at full capacity"));
        }

        // Occupied beds read under the target lock; concurrent assignments
        // are additionally fenced by the partial unique bed index.
        let occupied: Vec<(i16,)> = sqlx::query_as(
            r#"
            SELECT bed_number FROM residents
            WHERE room_id = $1 AND lifecycle = 'active' AND bed_number IS NOT NULL
            "#,
        )
        .bind(plan.target_room_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
        let occupied: Vec<i16> = occupied.into_iter().map(|(bed,)| bed).collect();

        let new_bed = lowest_free_bed(&occupied, capacity).ok_or_else(|| {
            PortError::invariant(format!(
                "No free bed in room {} though occupancy {} < capacity {}",
                plan.target_room_id, occupancy, capacity
            ))
        })?;

        // Source side: conditional decrement
        let done = sqlx::query(
            r#"
            UPDATE rooms
            SET current_occupancy = current_occupancy - 1,
                status = CASE WHEN status = 'full' THEN 'available' ELSE status END,
                updated_at = NOW()
            WHERE room_id = $1 AND lifecycle = 'active' AND current_occupancy > 0
            "#,
        )
        .bind(plan.source_room_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
        if done.rows_affected() == 0 {
            return Err(PortError::invariant(format!(
                "Source room {} has zero occupancy during transfer",
                plan.source_room_id
            )));
        }

        // Target side: conditional increment under the row lock
        let done = sqlx::query(
            r#"
            UPDATE rooms
            SET current_occupancy = current_occupancy + 1,
                status = CASE
                    WHEN current_occupancy + 1 >= capacity THEN 'full'
                    ELSE status
                END,
                updated_at = NOW()
            WHERE room_id = $1 AND lifecycle = 'active'
              AND current_occupancy < capacity
            "#,
        )
        .bind(plan.target_room_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
        if done.rows_affected() == 0 {
            return Err(PortError::conflict("Target room is at full capacity"));
        }

        // Move the resident
        let done = sqlx::query(
            r#"
            UPDATE residents
            SET room_id = $2, bed_number = $3, updated_at = NOW()
            WHERE resident_id = $1 AND lifecycle = 'active' AND room_id = $4
            "#,
        )
        .bind(plan.resident_id.as_uuid())
        .bind(plan.target_room_id.as_uuid())
        .bind(new_bed)
        .bind(plan.source_room_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
        if done.rows_affected() == 0 {
            return Err(PortError::conflict(
                "Resident no longer holds the source room",
            ));
        }

        // Append the audit row
        let record = plan.completed(new_bed);
        sqlx::query(
            r#"
            INSERT INTO room_changes (
                room_change_id, resident_id, old_room_id, new_room_id,
                old_bed_number, new_bed_number, status, requested_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.room_change_id.as_uuid())
        .bind(record.resident_id.as_uuid())
        .bind(record.old_room_id.as_uuid())
        .bind(record.new_room_id.as_uuid())
        .bind(record.old_bed_number)
        .bind(record.new_bed_number)
        .bind(record.status.as_str())
        .bind(record.requested_at)
        .bind(record.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(record)
    }

    async fn list_changes(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<RoomChangeRecord>, PortError> {
        let rows = sqlx::query_as::<_, RoomChangeRow>(
            r#"
            SELECT room_change_id, resident_id, old_room_id, new_room_id,
                   old_bed_number, new_bed_number, status, requested_at,
                   completed_at
            FROM room_changes
            WHERE resident_id = $1
            ORDER BY completed_at DESC
            "#,
        )
        .bind(resident_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| RoomChangeRecord::try_from(row).map_err(PortError::from))
            .collect()
    }
}
