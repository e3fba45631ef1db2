//! Payment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_billing::Payment;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub resident_id: Uuid,
    pub amount: Decimal,
    /// Billing period labels, e.g. `["March 2025"]`
    #[serde(default)]
    pub months: Vec<String>,
    pub due_date: Option<NaiveDate>,
    /// Defaults to `Paid`
    pub status: Option<String>,
    pub method: String,
    pub transaction_ref: Option<String>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub is_deposit: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub status: Option<String>,
    pub remarks: Option<String>,
    pub months: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsParams {
    pub resident_id: Option<Uuid>,
    pub status: Option<String>,
    pub month: Option<String>,
    pub is_deposit: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub resident_id: Uuid,
    pub amount: Decimal,
    pub months: Vec<String>,
    pub payment_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub receipt_number: String,
    pub method: String,
    pub transaction_ref: Option<String>,
    pub remarks: Option<String>,
    pub is_deposit: bool,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: *payment.payment_id.as_uuid(),
            resident_id: *payment.resident_id.as_uuid(),
            amount: payment.amount.amount(),
            months: payment
                .periods
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            payment_date: payment.payment_date,
            due_date: payment.due_date,
            status: payment.status.as_str().to_string(),
            receipt_number: payment.receipt_number,
            method: payment.method.as_str().to_string(),
            transaction_ref: payment.transaction_ref,
            remarks: payment.remarks,
            is_deposit: payment.is_deposit,
        }
    }
}
