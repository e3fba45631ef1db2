//! Settlement records
//!
//! A settlement is an administrative due adjustment with no corresponding
//! payment. Settlements are validated against the due calculator at write
//! time and are immutable after creation (archival aside).

use chrono::{DateTime, Utc};
use core_kernel::{BillingPeriod, Lifecycle, Money, ResidentId, SettlementId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;

/// Closed set of reasons an admin may settle a due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementReason {
    MidMonthEntry,
    SpecialDiscount,
    Compensation,
    AdminDiscretion,
    Other,
}

impl SettlementReason {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementReason::MidMonthEntry => "mid_month_entry",
            SettlementReason::SpecialDiscount => "special_discount",
            SettlementReason::Compensation => "compensation",
            SettlementReason::AdminDiscretion => "admin_discretion",
            SettlementReason::Other => "other",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            SettlementReason::MidMonthEntry => "Mid-month entry",
            SettlementReason::SpecialDiscount => "Special discount",
            SettlementReason::Compensation => "Compensation",
            SettlementReason::AdminDiscretion => "Admin discretion",
            SettlementReason::Other => "Other",
        }
    }
}

impl fmt::Display for SettlementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for SettlementReason {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mid_month_entry" => Ok(SettlementReason::MidMonthEntry),
            "special_discount" => Ok(SettlementReason::SpecialDiscount),
            "compensation" => Ok(SettlementReason::Compensation),
            "admin_discretion" => Ok(SettlementReason::AdminDiscretion),
            "other" => Ok(SettlementReason::Other),
            other => Err(BillingError::validation(format!(
                "Unknown settlement reason '{}'",
                other
            ))),
        }
    }
}

/// A settlement record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub settlement_id: SettlementId,
    pub resident_id: ResidentId,
    pub period: BillingPeriod,
    pub amount: Money,
    pub reason: SettlementReason,
    pub remarks: Option<String>,
    /// Identity of the admin who recorded the settlement
    pub settled_by: String,
    pub settled_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

/// Input for recording a settlement
#[derive(Debug, Clone)]
pub struct NewSettlement {
    pub resident_id: ResidentId,
    pub period: BillingPeriod,
    pub amount: Money,
    pub reason: SettlementReason,
    pub remarks: Option<String>,
}

/// A recorded settlement plus the due remaining after it
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    #[serde(flatten)]
    pub settlement: Settlement,
    pub remaining_due: Money,
}

impl Settlement {
    /// Creates a settlement record
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Validation` for a non-positive amount. The
    /// due-ceiling and duplicate checks happen in the settlement service
    /// and its conditional write.
    pub fn new(input: NewSettlement, settled_by: String) -> Result<Self, BillingError> {
        if !input.amount.is_positive() {
            return Err(BillingError::validation("Amount must be positive"));
        }

        Ok(Self {
            settlement_id: SettlementId::new_v7(),
            resident_id: input.resident_id,
            period: input.period,
            amount: input.amount,
            reason: input.reason,
            remarks: input.remarks,
            settled_by,
            settled_at: Utc::now(),
            lifecycle: Lifecycle::Active,
        })
    }

    /// Returns true when `other` would be an exact active duplicate
    pub fn duplicates(&self, other: &Settlement) -> bool {
        self.lifecycle.is_active()
            && other.lifecycle.is_active()
            && self.resident_id == other.resident_id
            && self.period == other.period
            && self.amount == other.amount
            && self.reason == other.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settlement(amount: i64, reason: SettlementReason) -> Settlement {
        Settlement::new(
            NewSettlement {
                resident_id: ResidentId::from_uuid(uuid::Uuid::nil()),
                period: "April 2025".parse().unwrap(),
                amount: Money::inr(rust_decimal::Decimal::new(amount, 0)),
                reason,
                remarks: None,
            },
            "admin".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_settlement_creation() {
        let s = settlement(4500, SettlementReason::AdminDiscretion);
        assert_eq!(s.amount, Money::inr(dec!(4500)));
        assert_eq!(s.settled_by, "admin");
        assert!(s.lifecycle.is_active());
    }

    #[test]
    fn test_rejects_nonpositive_amount() {
        let result = Settlement::new(
            NewSettlement {
                resident_id: ResidentId::new_v7(),
                period: "April 2025".parse().unwrap(),
                amount: Money::inr(dec!(0)),
                reason: SettlementReason::Other,
                remarks: None,
            },
            "admin".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_detection() {
        let a = settlement(4500, SettlementReason::AdminDiscretion);
        let b = settlement(4500, SettlementReason::AdminDiscretion);
        let c = settlement(4500, SettlementReason::Compensation);
        let d = settlement(100, SettlementReason::AdminDiscretion);

        assert!(a.duplicates(&b));
        assert!(!a.duplicates(&c));
        assert!(!a.duplicates(&d));
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(SettlementReason::MidMonthEntry.label(), "Mid-month entry");
        assert_eq!(
            SettlementReason::AdminDiscretion.to_string(),
            "Admin discretion"
        );
        assert_eq!(
            "special_discount".parse::<SettlementReason>().unwrap(),
            SettlementReason::SpecialDiscount
        );
    }
}
