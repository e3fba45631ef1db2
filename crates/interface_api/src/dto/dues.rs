//! Due calculation DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_billing::{DueStatement, ResidentDue};

#[derive(Debug, Deserialize)]
pub struct DueParams {
    /// Billing period label, e.g. `March 2025`
    pub month: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchDueRequest {
    /// The current billing period to derive against
    pub month: String,
    pub resident_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DueResponse {
    pub room_price: Decimal,
    pub total_paid: Decimal,
    pub total_settled: Decimal,
    pub effective_due: Decimal,
    pub is_fully_paid: bool,
    pub is_partially_paid: bool,
    pub status: String,
}

impl From<DueStatement> for DueResponse {
    fn from(statement: DueStatement) -> Self {
        Self {
            room_price: statement.room_price.amount(),
            total_paid: statement.total_paid.amount(),
            total_settled: statement.total_settled.amount(),
            effective_due: statement.effective_due.amount(),
            is_fully_paid: statement.is_fully_paid,
            is_partially_paid: statement.is_partially_paid,
            status: statement.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResidentDueResponse {
    pub resident_id: Uuid,
    pub room_id: Option<Uuid>,
    pub month: String,
    #[serde(flatten)]
    pub due: DueResponse,
}

impl From<ResidentDue> for ResidentDueResponse {
    fn from(row: ResidentDue) -> Self {
        Self {
            resident_id: *row.resident_id.as_uuid(),
            room_id: row.room_id.map(|id| *id.as_uuid()),
            month: row.period.as_str().to_string(),
            due: row.statement.into(),
        }
    }
}
