//! Due derivation
//!
//! The due calculator is a pure function of current ledger state: payments
//! never carry a cached due amount, and nothing computed here is persisted.
//! Repeated calls with no intervening writes return identical results.

use core_kernel::{BillingPeriod, Currency, Money, ResidentId, RoomId};
use serde::Serialize;

use crate::payment::Payment;
use crate::settlement::Settlement;

/// Payment state of a `(resident, period)`
///
/// A partial payment still reads `Unpaid`; the distinction is carried by
/// `is_partially_paid` on the statement instead of a fourth status. Both
/// fields are always serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DueStatus {
    #[serde(rename = "N/A")]
    NotApplicable,
    Paid,
    Unpaid,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::NotApplicable => "N/A",
            DueStatus::Paid => "Paid",
            DueStatus::Unpaid => "Unpaid",
        }
    }
}

/// The derived due position for one `(resident, period)`
#[derive(Debug, Clone, Serialize)]
pub struct DueStatement {
    pub room_price: Money,
    pub total_paid: Money,
    pub total_settled: Money,
    pub effective_due: Money,
    pub is_fully_paid: bool,
    pub is_partially_paid: bool,
    pub status: DueStatus,
}

impl DueStatement {
    /// Derives the due position from pre-summed totals
    ///
    /// `effective_due = max(0, room_price - total_paid - total_settled)`.
    /// A non-positive room price yields `N/A` with a zero due.
    pub fn calculate(room_price: Money, total_paid: Money, total_settled: Money) -> Self {
        if !room_price.is_positive() {
            return Self {
                room_price,
                total_paid,
                total_settled,
                effective_due: Money::zero(room_price.currency()),
                is_fully_paid: false,
                is_partially_paid: false,
                status: DueStatus::NotApplicable,
            };
        }

        let covered = total_paid + total_settled;
        let effective_due = (room_price - covered).or_zero_if_negative();
        let is_fully_paid = covered.amount() >= room_price.amount();
        let is_partially_paid = !is_fully_paid && covered.is_positive();

        Self {
            room_price,
            total_paid,
            total_settled,
            effective_due,
            is_fully_paid,
            is_partially_paid,
            status: if is_fully_paid {
                DueStatus::Paid
            } else {
                DueStatus::Unpaid
            },
        }
    }

    /// Derives the due position from raw ledger records
    ///
    /// Only active, non-deposit payments with status `Paid` that cover the
    /// period contribute to `total_paid`; only active settlements for the
    /// period contribute to `total_settled`.
    pub fn from_records(
        room_price: Money,
        period: &BillingPeriod,
        payments: &[Payment],
        settlements: &[Settlement],
    ) -> Self {
        let currency = room_price.currency();

        let total_paid = payments
            .iter()
            .filter(|p| p.counts_toward_due(period))
            .fold(Money::zero(currency), |acc, p| acc + p.amount);

        let total_settled = settlements
            .iter()
            .filter(|s| s.lifecycle.is_active() && &s.period == period)
            .fold(Money::zero(currency), |acc, s| acc + s.amount);

        Self::calculate(room_price, total_paid, total_settled)
    }

    /// The statement for a resident without a room: no price, no due
    pub fn not_applicable() -> Self {
        Self::calculate(
            Money::zero(Currency::INR),
            Money::zero(Currency::INR),
            Money::zero(Currency::INR),
        )
    }
}

/// One row of a batch due derivation
#[derive(Debug, Clone, Serialize)]
pub struct ResidentDue {
    pub resident_id: ResidentId,
    pub room_id: Option<RoomId>,
    pub period: BillingPeriod,
    #[serde(flatten)]
    pub statement: DueStatement,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{NewPayment, PaymentMethod, PaymentStatus};
    use crate::settlement::{NewSettlement, SettlementReason};
    use rust_decimal_macros::dec;

    fn paid_payment(resident: ResidentId, amount: Money, period: &str) -> Payment {
        Payment::new(
            NewPayment {
                resident_id: resident,
                amount,
                periods: vec![period.parse().unwrap()],
                due_date: None,
                status: PaymentStatus::Paid,
                method: PaymentMethod::Cash,
                transaction_ref: None,
                remarks: None,
                is_deposit: false,
            },
            "C00001".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_partial_payment_reads_unpaid() {
        // Room price 9500, one Paid payment of 5000 for April 2025
        let resident = ResidentId::new_v7();
        let period: BillingPeriod = "April 2025".parse().unwrap();
        let payments = vec![paid_payment(resident, Money::inr(dec!(5000)), "April 2025")];

        let statement =
            DueStatement::from_records(Money::inr(dec!(9500)), &period, &payments, &[]);

        assert_eq!(statement.effective_due, Money::inr(dec!(4500)));
        assert!(statement.is_partially_paid);
        assert!(!statement.is_fully_paid);
        assert_eq!(statement.status, DueStatus::Unpaid);
    }

    #[test]
    fn test_settlement_closes_the_due() {
        let resident = ResidentId::new_v7();
        let period: BillingPeriod = "April 2025".parse().unwrap();
        let payments = vec![paid_payment(resident, Money::inr(dec!(5000)), "April 2025")];
        let settlement = Settlement::new(
            NewSettlement {
                resident_id: resident,
                period: period.clone(),
                amount: Money::inr(dec!(4500)),
                reason: SettlementReason::AdminDiscretion,
                remarks: None,
            },
            "admin".to_string(),
        )
        .unwrap();

        let statement = DueStatement::from_records(
            Money::inr(dec!(9500)),
            &period,
            &payments,
            &[settlement],
        );

        assert!(statement.effective_due.is_zero());
        assert!(statement.is_fully_paid);
        assert_eq!(statement.status, DueStatus::Paid);
    }

    #[test]
    fn test_due_and_overdue_payments_contribute_nothing() {
        let resident = ResidentId::new_v7();
        let period: BillingPeriod = "April 2025".parse().unwrap();
        let mut unpaid = paid_payment(resident, Money::inr(dec!(5000)), "April 2025");
        unpaid.status = PaymentStatus::Due;

        let statement = DueStatement::from_records(
            Money::inr(dec!(9500)),
            &period,
            &[unpaid],
            &[],
        );

        assert!(statement.total_paid.is_zero());
        assert_eq!(statement.effective_due, Money::inr(dec!(9500)));
    }

    #[test]
    fn test_zero_price_is_not_applicable() {
        let statement = DueStatement::calculate(
            Money::inr(dec!(0)),
            Money::inr(dec!(0)),
            Money::inr(dec!(0)),
        );
        assert_eq!(statement.status, DueStatus::NotApplicable);
        assert!(statement.effective_due.is_zero());
    }

    #[test]
    fn test_overpayment_clamps_to_zero_due() {
        let statement = DueStatement::calculate(
            Money::inr(dec!(9500)),
            Money::inr(dec!(12000)),
            Money::inr(dec!(0)),
        );
        assert!(statement.effective_due.is_zero());
        assert!(statement.is_fully_paid);
    }

    #[test]
    fn test_status_serializes_with_spec_labels() {
        assert_eq!(
            serde_json::to_string(&DueStatus::NotApplicable).unwrap(),
            "\"N/A\""
        );
        assert_eq!(serde_json::to_string(&DueStatus::Unpaid).unwrap(), "\"Unpaid\"");
    }

    #[test]
    fn test_calculation_is_idempotent() {
        let price = Money::inr(dec!(9500));
        let paid = Money::inr(dec!(5000));
        let settled = Money::inr(dec!(1000));

        let a = DueStatement::calculate(price, paid, settled);
        let b = DueStatement::calculate(price, paid, settled);

        assert_eq!(a.effective_due, b.effective_due);
        assert_eq!(a.status, b.status);
        assert_eq!(a.is_partially_paid, b.is_partially_paid);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    proptest! {
        #[test]
        fn effective_due_is_never_negative(
            price in 0i64..10_000_000,
            paid in 0i64..10_000_000,
            settled in 0i64..10_000_000
        ) {
            let statement = DueStatement::calculate(
                Money::inr(Decimal::new(price, 2)),
                Money::inr(Decimal::new(paid, 2)),
                Money::inr(Decimal::new(settled, 2)),
            );
            prop_assert!(!statement.effective_due.is_negative());
        }

        #[test]
        fn paid_status_iff_covered(
            price in 1i64..10_000_000,
            paid in 0i64..10_000_000,
            settled in 0i64..10_000_000
        ) {
            let statement = DueStatement::calculate(
                Money::inr(Decimal::new(price, 2)),
                Money::inr(Decimal::new(paid, 2)),
                Money::inr(Decimal::new(settled, 2)),
            );
            let covered = paid + settled >= price;
            prop_assert_eq!(statement.is_fully_paid, covered);
            prop_assert_eq!(statement.status == DueStatus::Paid, covered);
        }
    }
}
