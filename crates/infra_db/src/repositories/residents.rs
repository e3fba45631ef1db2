//! Resident repository
//!
//! PostgreSQL adapter for `ResidentPort`. Bed uniqueness within a room is
//! backed by a partial unique index over `(room_id, bed_number)` for active
//! residents; the deposit update is one conditional statement that also
//! approves a pending registration.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{DomainPort, Lifecycle, Money, PortError, ResidentId, RoomId};
use domain_occupancy::ports::ResidentPort;
use domain_occupancy::resident::{ApprovalStatus, Resident};

use crate::error::DatabaseError;

/// Repository for resident records
#[derive(Debug, Clone)]
pub struct ResidentRepository {
    pool: PgPool,
}

impl ResidentRepository {
    /// Creates a new ResidentRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row for a resident
#[derive(Debug, Clone, FromRow)]
pub struct ResidentRow {
    pub resident_id: Uuid,
    pub name: String,
    pub email: String,
    pub room_id: Option<Uuid>,
    pub bed_number: Option<i16>,
    pub approval: String,
    pub on_notice_period: bool,
    pub last_staying_date: Option<NaiveDate>,
    pub deposit_fees: Decimal,
    pub lifecycle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResidentRow> for Resident {
    type Error = DatabaseError;

    fn try_from(row: ResidentRow) -> Result<Self, Self::Error> {
        let approval = match row.approval.as_str() {
            "pending" => ApprovalStatus::Pending,
            "approved" => ApprovalStatus::Approved,
            other => {
                return Err(DatabaseError::DecodeFailed(format!(
                    "unknown approval status '{}'",
                    other
                )))
            }
        };
        Ok(Resident {
            resident_id: ResidentId::from_uuid(row.resident_id),
            name: row.name,
            email: row.email,
            room_id: row.room_id.map(RoomId::from_uuid),
            bed_number: row.bed_number,
            approval,
            on_notice_period: row.on_notice_period,
            last_staying_date: row.last_staying_date,
            deposit_fees: Money::inr(row.deposit_fees),
            lifecycle: row
                .lifecycle
                .parse::<Lifecycle>()
                .map_err(DatabaseError::DecodeFailed)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_RESIDENT: &str = r#"
    SELECT resident_id, name, email, room_id, bed_number, approval,
           on_notice_period, last_staying_date, deposit_fees, lifecycle,
           created_at, updated_at
    FROM residents
"#;

impl DomainPort for ResidentRepository {}

#[async_trait]
impl ResidentPort for ResidentRepository {
    async fn create_resident(&self, resident: &Resident) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO residents (
                resident_id, name, email, room_id, bed_number, approval,
                on_notice_period, last_staying_date, deposit_fees, lifecycle,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(resident.resident_id.as_uuid())
        .bind(&resident.name)
        .bind(&resident.email)
        .bind(resident.room_id.map(|id| *id.as_uuid()))
        .bind(resident.bed_number)
        .bind(resident.approval.as_str())
        .bind(resident.on_notice_period)
        .bind(resident.last_staying_date)
        .bind(resident.deposit_fees.amount())
        .bind(resident.lifecycle.as_str())
        .bind(resident.created_at)
        .bind(resident.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(())
    }

    async fn get_resident(&self, id: ResidentId) -> Result<Resident, PortError> {
        let row = sqlx::query_as::<_, ResidentRow>(&format!(
            "{SELECT_RESIDENT} WHERE resident_id = $1 AND lifecycle = 'active'"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PortError::not_found("Resident", id))?;

        Ok(Resident::try_from(row).map_err(PortError::from)?)
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Resident>, PortError> {
        let rows = sqlx::query_as::<_, ResidentRow>(&format!(
            "{SELECT_RESIDENT} WHERE room_id = $1 AND lifecycle = 'active' \
             ORDER BY bed_number"
        ))
        .bind(room_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| Resident::try_from(row).map_err(PortError::from))
            .collect()
    }

    async fn update_resident(&self, resident: &Resident) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE residents
            SET name = $2, email = $3, room_id = $4, bed_number = $5,
                approval = $6, on_notice_period = $7, last_staying_date = $8,
                updated_at = $9
            WHERE resident_id = $1 AND lifecycle = 'active'
            "#,
        )
        .bind(resident.resident_id.as_uuid())
        .bind(&resident.name)
        .bind(&resident.email)
        .bind(resident.room_id.map(|id| *id.as_uuid()))
        .bind(resident.bed_number)
        .bind(resident.approval.as_str())
        .bind(resident.on_notice_period)
        .bind(resident.last_staying_date)
        .bind(resident.updated_at)
        .execute(&self.pool)
        .await;

        match result.map_err(DatabaseError::from) {
            Ok(done) if done.rows_affected() == 0 => {
                Err(PortError::not_found("Resident", resident.resident_id))
            }
            Ok(_) => Ok(()),
            Err(DatabaseError::DuplicateEntry(_)) => Err(PortError::conflict(format!(
                "Bed {} in the room is already taken",
                resident.bed_number.unwrap_or_default()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn add_deposit(&self, id: ResidentId, amount: Money) -> Result<Resident, PortError> {
        if !amount.is_positive() {
            return Err(PortError::validation("Deposit amount must be positive"));
        }

        let row = sqlx::query_as::<_, ResidentRow>(
            r#"
            UPDATE residents
            SET deposit_fees = deposit_fees + $2,
                approval = 'approved',
                updated_at = NOW()
            WHERE resident_id = $1 AND lifecycle = 'active'
            RETURNING resident_id, name, email, room_id, bed_number, approval,
                      on_notice_period, last_staying_date, deposit_fees,
                      lifecycle, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PortError::not_found("Resident", id))?;

        Ok(Resident::try_from(row).map_err(PortError::from)?)
    }
}
