//! Payment records
//!
//! A payment covers one or more billing periods for a resident. Rent
//! payments participate in the no-double-booking invariant and in due
//! derivation; deposit payments are excluded from both and instead feed the
//! resident's deposit total.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{BillingPeriod, Lifecycle, Money, PaymentId, ResidentId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::BillingError;

/// How the payment was collected
///
/// Collection itself (gateway integration) is out of scope; the method is
/// recorded for the receipt only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    BankTransfer,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "card" => Ok(PaymentMethod::Card),
            "other" => Ok(PaymentMethod::Other),
            other => Err(BillingError::validation(format!(
                "Unknown payment method '{}'",
                other
            ))),
        }
    }
}

/// Payment status
///
/// Only `Paid` payments count toward dues; `Due` and `Overdue` records
/// contribute nothing until they flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Due,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Due => "Due",
            PaymentStatus::Overdue => "Overdue",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paid" => Ok(PaymentStatus::Paid),
            "Due" => Ok(PaymentStatus::Due),
            "Overdue" => Ok(PaymentStatus::Overdue),
            other => Err(BillingError::validation(format!(
                "Unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// A payment record
///
/// Created once, mutated only for status, remarks, and periods (the latter
/// re-validated), never hard-deleted. The receipt number is issued before
/// the record persists and is never reused, not even after archival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub resident_id: ResidentId,
    pub amount: Money,
    /// Billing periods this payment covers
    pub periods: Vec<BillingPeriod>,
    pub payment_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub receipt_number: String,
    pub method: PaymentMethod,
    /// External transaction reference (bank/UPI id)
    pub transaction_ref: Option<String>,
    pub remarks: Option<String>,
    pub is_deposit: bool,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub resident_id: ResidentId,
    pub amount: Money,
    pub periods: Vec<BillingPeriod>,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub remarks: Option<String>,
    pub is_deposit: bool,
}

/// Partial update for a payment; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub status: Option<PaymentStatus>,
    pub remarks: Option<String>,
    pub periods: Option<Vec<BillingPeriod>>,
}

impl Payment {
    /// Creates a payment with an already-issued receipt number
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Validation` for a non-positive amount or a
    /// rent payment without billing periods.
    pub fn new(input: NewPayment, receipt_number: String) -> Result<Self, BillingError> {
        if !input.amount.is_positive() {
            return Err(BillingError::validation("Amount must be positive"));
        }
        if !input.is_deposit && input.periods.is_empty() {
            return Err(BillingError::validation(
                "A rent payment must cover at least one billing period",
            ));
        }

        let now = Utc::now();
        Ok(Self {
            payment_id: PaymentId::new_v7(),
            resident_id: input.resident_id,
            amount: input.amount,
            periods: input.periods,
            payment_date: now,
            due_date: input.due_date,
            status: input.status,
            receipt_number,
            method: input.method,
            transaction_ref: input.transaction_ref,
            remarks: input.remarks,
            is_deposit: input.is_deposit,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true when this payment covers the given period
    pub fn covers(&self, period: &BillingPeriod) -> bool {
        self.periods.contains(period)
    }

    /// Returns true when this payment counts toward dues for the period
    pub fn counts_toward_due(&self, period: &BillingPeriod) -> bool {
        self.lifecycle.is_active()
            && !self.is_deposit
            && self.status == PaymentStatus::Paid
            && self.covers(period)
    }

    /// Applies a partial update
    ///
    /// The caller must re-run the double-booking check (excluding this
    /// record) before persisting a period change.
    pub fn apply_update(&mut self, update: PaymentUpdate) -> Result<(), BillingError> {
        if let Some(periods) = update.periods {
            if !self.is_deposit && periods.is_empty() {
                return Err(BillingError::validation(
                    "A rent payment must cover at least one billing period",
                ));
            }
            self.periods = periods;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(remarks) = update.remarks {
            self.remarks = Some(remarks);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
