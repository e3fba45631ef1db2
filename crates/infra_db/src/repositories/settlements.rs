//! Settlement repository
//!
//! PostgreSQL adapter for `SettlementPort`. The due-ceiling validation and
//! the insert are one conditional statement, serialized per
//! `(resident, period)` with a transaction-scoped advisory lock, so two
//! concurrent settlements can never jointly exceed the room price. Exact
//! duplicates are additionally backed by a partial unique index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{
    BillingPeriod, DomainPort, Lifecycle, Money, PortError, ResidentId, SettlementId,
};
use domain_billing::ports::SettlementPort;
use domain_billing::settlement::{Settlement, SettlementReason};

use crate::error::DatabaseError;

/// Repository for settlement records
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: PgPool,
}

impl SettlementRepository {
    /// Creates a new SettlementRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row for a settlement
#[derive(Debug, Clone, FromRow)]
pub struct SettlementRow {
    pub settlement_id: Uuid,
    pub resident_id: Uuid,
    pub period: String,
    pub amount: Decimal,
    pub reason: String,
    pub remarks: Option<String>,
    pub settled_by: String,
    pub settled_at: DateTime<Utc>,
    pub lifecycle: String,
}

impl TryFrom<SettlementRow> for Settlement {
    type Error = DatabaseError;

    fn try_from(row: SettlementRow) -> Result<Self, Self::Error> {
        let decode = |e: String| DatabaseError::DecodeFailed(e);
        Ok(Settlement {
            settlement_id: SettlementId::from_uuid(row.settlement_id),
            resident_id: ResidentId::from_uuid(row.resident_id),
            period: row
                .period
                .parse::<BillingPeriod>()
                .map_err(|e| decode(e.to_string()))?,
            amount: Money::inr(row.amount),
            reason: row
                .reason
                .parse::<SettlementReason>()
                .map_err(|e| decode(e.to_string()))?,
            remarks: row.remarks,
            settled_by: row.settled_by,
            settled_at: row.settled_at,
            lifecycle: row.lifecycle.parse::<Lifecycle>().map_err(decode)?,
        })
    }
}

const SELECT_SETTLEMENT: &str = r#"
    SELECT settlement_id, resident_id, period, amount, reason, remarks,
           settled_by, settled_at, lifecycle
    FROM settlements
"#;

impl DomainPort for SettlementRepository {}

#[async_trait]
impl SettlementPort for SettlementRepository {
    async fn create_settlement_checked(
        &self,
        settlement: &Settlement,
        room_price: Money,
    ) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        // Serialize concurrent settlements of the same (resident, period).
        // The lock is transaction-scoped and released on commit or abort.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1 || ':' || $2))")
            .bind(settlement.resident_id.as_uuid().to_string())
            .bind(settlement.period.as_str())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        let result = sqlx::query(
            r#"
            WITH due AS (
                SELECT $9::NUMERIC
                    - COALESCE((
                        SELECT SUM(p.amount) FROM payments p
                        WHERE p.resident_id = $2
                          AND p.lifecycle = 'active'
                          AND NOT p.is_deposit
                          AND p.status = 'Paid'
                          AND $3 = ANY(p.periods)
                    ), 0)
                    - COALESCE((
                        SELECT SUM(s.amount) FROM settlements s
                        WHERE s.resident_id = $2
                          AND s.period = $3
                          AND s.lifecycle = 'active'
                    ), 0) AS effective_due
            )
            INSERT INTO settlements (
                settlement_id, resident_id, period, amount, reason, remarks,
                settled_by, settled_at, lifecycle
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, 'active'
            FROM due
            WHERE due.effective_due > 0 AND $4 <= due.effective_due
            "#,
        )
        .bind(settlement.settlement_id.as_uuid())
        .bind(settlement.resident_id.as_uuid())
        .bind(settlement.period.as_str())
        .bind(settlement.amount.amount())
        .bind(settlement.reason.as_str())
        .bind(&settlement.remarks)
        .bind(&settlement.settled_by)
        .bind(settlement.settled_at)
        .bind(room_price.amount())
        .execute(&mut *tx)
        .await;

        let done = match result.map_err(DatabaseError::from) {
            Ok(done) => done,
            Err(DatabaseError::DuplicateEntry(_)) => {
                return Err(PortError::conflict(format!(
                    "An identical settlement already exists for {}",
                    settlement.period
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if done.rows_affected() == 0 {
            // The conditional write refused: the due ceiling no longer
            // admits this amount.
            return Err(PortError::conflict(format!(
                "Settlement of {} rejected: no sufficient due remains for {}",
                settlement.amount, settlement.period
            )));
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn list_settlements(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<Settlement>, PortError> {
        let rows = sqlx::query_as::<_, SettlementRow>(&format!(
            "{SELECT_SETTLEMENT} WHERE resident_id = $1 AND lifecycle = 'active' \
             ORDER BY settled_at DESC"
        ))
        .bind(resident_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| Settlement::try_from(row).map_err(PortError::from))
            .collect()
    }

    async fn list_for_period(
        &self,
        resident_id: ResidentId,
        period: &BillingPeriod,
    ) -> Result<Vec<Settlement>, PortError> {
        let rows = sqlx::query_as::<_, SettlementRow>(&format!(
            "{SELECT_SETTLEMENT} WHERE resident_id = $1 AND period = $2 \
             AND lifecycle = 'active' ORDER BY settled_at DESC"
        ))
        .bind(resident_id.as_uuid())
        .bind(period.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| Settlement::try_from(row).map_err(PortError::from))
            .collect()
    }
}
