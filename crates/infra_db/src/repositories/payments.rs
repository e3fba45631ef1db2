//! Payment repository
//!
//! PostgreSQL adapter for `PaymentPort`. Covered periods are stored twice
//! on purpose: denormalized as an array on the payment row for reads, and
//! as rows in `payment_periods` where a partial unique index over
//! `(resident_id, period)` for active non-deposit rows is the authoritative
//! double-booking backstop. Both are written in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use core_kernel::{
    BillingPeriod, DomainPort, Lifecycle, Money, PaymentId, PortError, ResidentId,
};
use domain_billing::payment::{Payment, PaymentMethod, PaymentStatus};
use domain_billing::ports::{PaymentPort, PaymentQuery};

use crate::error::DatabaseError;

/// Repository for payment records
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row for a payment
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub resident_id: Uuid,
    pub amount: Decimal,
    pub periods: Vec<String>,
    pub payment_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub receipt_number: String,
    pub method: String,
    pub transaction_ref: Option<String>,
    pub remarks: Option<String>,
    pub is_deposit: bool,
    pub lifecycle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let decode = |e: String| DatabaseError::DecodeFailed(e);
        let periods = row
            .periods
            .iter()
            .map(|p| p.parse::<BillingPeriod>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode(e.to_string()))?;

        Ok(Payment {
            payment_id: PaymentId::from_uuid(row.payment_id),
            resident_id: ResidentId::from_uuid(row.resident_id),
            amount: Money::inr(row.amount),
            periods,
            payment_date: row.payment_date,
            due_date: row.due_date,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|e| decode(e.to_string()))?,
            receipt_number: row.receipt_number,
            method: row
                .method
                .parse::<PaymentMethod>()
                .map_err(|e| decode(e.to_string()))?,
            transaction_ref: row.transaction_ref,
            remarks: row.remarks,
            is_deposit: row.is_deposit,
            lifecycle: row.lifecycle.parse::<Lifecycle>().map_err(decode)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT payment_id, resident_id, amount, periods, payment_date, due_date,
           status, receipt_number, method, transaction_ref, remarks,
           is_deposit, lifecycle, created_at, updated_at
    FROM payments
"#;

/// Rewrites the `payment_periods` rows for a payment inside a transaction
async fn write_period_rows(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM payment_periods WHERE payment_id = $1")
        .bind(payment.payment_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    for period in &payment.periods {
        sqlx::query(
            r#"
            INSERT INTO payment_periods (payment_id, resident_id, period, is_deposit, lifecycle)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(payment.payment_id.as_uuid())
        .bind(payment.resident_id.as_uuid())
        .bind(period.as_str())
        .bind(payment.is_deposit)
        .bind(payment.lifecycle.as_str())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;
    }

    Ok(())
}

fn map_booking_conflict(error: DatabaseError) -> PortError {
    match error {
        DatabaseError::DuplicateEntry(_) => PortError::conflict(
            "One of the billing periods already carries an active payment".to_string(),
        ),
        e => e.into(),
    }
}

impl DomainPort for PaymentRepository {}

#[async_trait]
impl PaymentPort for PaymentRepository {
    async fn create_payment(&self, payment: &Payment) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, resident_id, amount, periods, payment_date,
                due_date, status, receipt_number, method, transaction_ref,
                remarks, is_deposit, lifecycle, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(payment.payment_id.as_uuid())
        .bind(payment.resident_id.as_uuid())
        .bind(payment.amount.amount())
        .bind(
            payment
                .periods
                .iter()
                .map(|p| p.as_str().to_string())
                .collect::<Vec<_>>(),
        )
        .bind(payment.payment_date)
        .bind(payment.due_date)
        .bind(payment.status.as_str())
        .bind(&payment.receipt_number)
        .bind(payment.method.as_str())
        .bind(&payment.transaction_ref)
        .bind(&payment.remarks)
        .bind(payment.is_deposit)
        .bind(payment.lifecycle.as_str())
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)
        .map_err(map_booking_conflict)?;

        write_period_rows(&mut tx, payment)
            .await
            .map_err(map_booking_conflict)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "{SELECT_PAYMENT} WHERE payment_id = $1 AND lifecycle = 'active'"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PortError::not_found("Payment", id))?;

        Ok(Payment::try_from(row).map_err(PortError::from)?)
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let done = sqlx::query(
            r#"
            UPDATE payments
            SET amount = $2, periods = $3, due_date = $4, status = $5,
                method = $6, transaction_ref = $7, remarks = $8, updated_at = $9
            WHERE payment_id = $1 AND lifecycle = 'active'
            "#,
        )
        .bind(payment.payment_id.as_uuid())
        .bind(payment.amount.amount())
        .bind(
            payment
                .periods
                .iter()
                .map(|p| p.as_str().to_string())
                .collect::<Vec<_>>(),
        )
        .bind(payment.due_date)
        .bind(payment.status.as_str())
        .bind(payment.method.as_str())
        .bind(&payment.transaction_ref)
        .bind(&payment.remarks)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if done.rows_affected() == 0 {
            return Err(PortError::not_found("Payment", payment.payment_id));
        }

        write_period_rows(&mut tx, payment)
            .await
            .map_err(map_booking_conflict)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn archive_payment(&self, id: PaymentId) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let done = sqlx::query(
            r#"
            UPDATE payments
            SET lifecycle = 'archived', updated_at = NOW()
            WHERE payment_id = $1 AND lifecycle = 'active'
            "#,
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if done.rows_affected() == 0 {
            return Err(PortError::not_found("Payment", id));
        }

        // Archived period rows drop out of the partial unique index, so the
        // periods become bookable again while the receipt stays taken.
        sqlx::query("UPDATE payment_periods SET lifecycle = 'archived' WHERE payment_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Payment>, PortError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{SELECT_PAYMENT} \
             WHERE ($1 OR lifecycle = 'active') \
               AND ($2::uuid IS NULL OR resident_id = $2) \
               AND ($3::text IS NULL OR status = $3) \
               AND ($4::boolean IS NULL OR is_deposit = $4) \
               AND ($5::text IS NULL OR $5 = ANY(periods)) \
             ORDER BY payment_date DESC, created_at DESC"
        ))
        .bind(query.include_archived)
        .bind(query.resident_id.map(|id| *id.as_uuid()))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.is_deposit)
        .bind(query.period.as_ref().map(|p| p.as_str().to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| Payment::try_from(row).map_err(PortError::from))
            .collect()
    }

    async fn conflicting_periods(
        &self,
        resident_id: ResidentId,
        periods: &[BillingPeriod],
        exclude: Option<PaymentId>,
    ) -> Result<Vec<BillingPeriod>, PortError> {
        let labels: Vec<String> = periods.iter().map(|p| p.as_str().to_string()).collect();

        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT period FROM payment_periods
            WHERE resident_id = $1
              AND period = ANY($2)
              AND lifecycle = 'active'
              AND NOT is_deposit
              AND ($3::uuid IS NULL OR payment_id <> $3)
            ORDER BY period
            "#,
        )
        .bind(resident_id.as_uuid())
        .bind(&labels)
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|(label,)| {
                label
                    .parse::<BillingPeriod>()
                    .map_err(|e| DatabaseError::DecodeFailed(e.to_string()).into())
            })
            .collect()
    }
}
