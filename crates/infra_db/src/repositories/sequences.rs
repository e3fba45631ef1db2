//! Sequence counter repository
//!
//! PostgreSQL adapter for `SequencePort`. The increment is one upsert
//! statement, so it is atomic by construction: there is no separate read
//! followed by a separate write anywhere in the path, and N concurrent
//! callers receive N distinct, strictly increasing values. If the statement
//! fails the operation fails explicitly; there is no non-atomic fallback.

use async_trait::async_trait;
use sqlx::PgPool;

use core_kernel::{DomainPort, PortError};
use domain_billing::receipt::SequencePort;

use crate::error::DatabaseError;

/// Repository for named atomic counters
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: PgPool,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for SequenceRepository {}

#[async_trait]
impl SequencePort for SequenceRepository {
    async fn next_value(&self, name: &str) -> Result<i64, PortError> {
        let (value,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sequence_counters (name, value)
            VALUES ($1, 1)
            ON CONFLICT (name)
            DO UPDATE SET value = sequence_counters.value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(value)
    }
}
