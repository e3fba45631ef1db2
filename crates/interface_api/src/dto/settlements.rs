//! Settlement DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_billing::{Settlement, SettlementOutcome};

#[derive(Debug, Deserialize)]
pub struct CreateSettlementRequest {
    pub resident_id: Uuid,
    /// Billing period label, e.g. `April 2025`
    pub month: String,
    pub amount: Decimal,
    /// One of `mid_month_entry`, `special_discount`, `compensation`,
    /// `admin_discretion`, `other`
    pub reason: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub settlement_id: Uuid,
    pub resident_id: Uuid,
    pub month: String,
    pub amount: Decimal,
    pub reason: String,
    pub reason_label: String,
    pub remarks: Option<String>,
    pub settled_by: String,
    pub settled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_due: Option<Decimal>,
}

impl From<Settlement> for SettlementResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            settlement_id: *settlement.settlement_id.as_uuid(),
            resident_id: *settlement.resident_id.as_uuid(),
            month: settlement.period.as_str().to_string(),
            amount: settlement.amount.amount(),
            reason: settlement.reason.as_str().to_string(),
            reason_label: settlement.reason.label().to_string(),
            remarks: settlement.remarks,
            settled_by: settlement.settled_by,
            settled_at: settlement.settled_at,
            remaining_due: None,
        }
    }
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        let remaining = outcome.remaining_due.amount();
        let mut response = Self::from(outcome.settlement);
        response.remaining_due = Some(remaining);
        response
    }
}
