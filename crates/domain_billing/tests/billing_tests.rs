//! Comprehensive tests for domain_billing

use core_kernel::{BillingPeriod, Money, ResidentId};
use rust_decimal_macros::dec;

use domain_billing::dues::{DueStatement, DueStatus};
use domain_billing::payment::{NewPayment, Payment, PaymentMethod, PaymentStatus, PaymentUpdate};
use domain_billing::receipt::ReceiptNumbers;
use domain_billing::settlement::{NewSettlement, Settlement, SettlementReason};

fn rent_payment(amount: i64, periods: &[&str], status: PaymentStatus) -> Payment {
    Payment::new(
        NewPayment {
            resident_id: ResidentId::from_uuid(uuid::Uuid::nil()),
            amount: Money::inr(rust_decimal::Decimal::new(amount, 0)),
            periods: periods.iter().map(|p| p.parse().unwrap()).collect(),
            due_date: None,
            status,
            method: PaymentMethod::Cash,
            transaction_ref: None,
            remarks: None,
            is_deposit: false,
        },
        "C00001".to_string(),
    )
    .unwrap()
}

// ============================================================================
// Receipt Number Tests
// ============================================================================

mod receipt_tests {
    use super::*;

    #[test]
    fn format_matches_the_documented_shape() {
        assert_eq!(ReceiptNumbers::format(1), "C00001");
        assert_eq!(ReceiptNumbers::format(6), "C00006");
        assert_eq!(ReceiptNumbers::format(7), "C00007");
    }

    #[test]
    fn formatted_numbers_sort_like_their_values() {
        let numbers: Vec<String> = (1..=200).map(ReceiptNumbers::format).collect();
        let mut sorted = numbers.clone();
        sorted.sort();
        assert_eq!(numbers, sorted);
    }
}

// ============================================================================
// Payment Tests
// ============================================================================

mod payment_tests {
    use super::*;

    #[test]
    fn multi_period_payment_covers_each_month() {
        let payment = rent_payment(16000, &["March 2025", "April 2025"], PaymentStatus::Paid);

        let march: BillingPeriod = "March 2025".parse().unwrap();
        let april: BillingPeriod = "April 2025".parse().unwrap();
        let may: BillingPeriod = "May 2025".parse().unwrap();

        assert!(payment.covers(&march));
        assert!(payment.covers(&april));
        assert!(!payment.covers(&may));
    }

    #[test]
    fn update_can_flip_status_without_touching_periods() {
        let mut payment = rent_payment(8000, &["March 2025"], PaymentStatus::Due);

        payment
            .apply_update(PaymentUpdate {
                status: Some(PaymentStatus::Paid),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.periods.len(), 1);
    }

    #[test]
    fn update_cannot_strip_all_periods_from_rent() {
        let mut payment = rent_payment(8000, &["March 2025"], PaymentStatus::Paid);

        assert!(payment
            .apply_update(PaymentUpdate {
                periods: Some(vec![]),
                ..Default::default()
            })
            .is_err());
    }

    #[test]
    fn payment_round_trips_through_json() {
        let payment = rent_payment(8000, &["March 2025"], PaymentStatus::Paid);
        let json = serde_json::to_string(&payment).unwrap();
        let back: Payment = serde_json::from_str(&json).unwrap();

        assert_eq!(back.payment_id, payment.payment_id);
        assert_eq!(back.receipt_number, payment.receipt_number);
        assert_eq!(back.periods, payment.periods);
    }
}

// ============================================================================
// Due Calculator Tests
// ============================================================================

mod due_tests {
    use super::*;

    #[test]
    fn a_due_payment_covering_the_period_still_counts_nothing() {
        let period: BillingPeriod = "March 2025".parse().unwrap();
        let payments = vec![
            rent_payment(5000, &["March 2025"], PaymentStatus::Paid),
            rent_payment(3000, &["March 2025"], PaymentStatus::Overdue),
        ];

        let statement =
            DueStatement::from_records(Money::inr(dec!(9500)), &period, &payments, &[]);

        // Only the Paid 5000 contributes
        assert_eq!(statement.total_paid, Money::inr(dec!(5000)));
        assert_eq!(statement.effective_due, Money::inr(dec!(4500)));
    }

    #[test]
    fn multi_period_payment_counts_full_amount_per_period() {
        // The ledger attributes the whole amount to each covered period;
        // proration across periods is not part of the model.
        let march: BillingPeriod = "March 2025".parse().unwrap();
        let payments = vec![rent_payment(
            8000,
            &["March 2025", "April 2025"],
            PaymentStatus::Paid,
        )];

        let statement =
            DueStatement::from_records(Money::inr(dec!(8000)), &march, &payments, &[]);
        assert!(statement.is_fully_paid);
    }

    #[test]
    fn statuses_cover_all_three_outcomes() {
        let zero = Money::inr(dec!(0));
        let price = Money::inr(dec!(9500));

        let na = DueStatement::calculate(zero, zero, zero);
        assert_eq!(na.status, DueStatus::NotApplicable);

        let unpaid = DueStatement::calculate(price, zero, zero);
        assert_eq!(unpaid.status, DueStatus::Unpaid);
        assert!(!unpaid.is_partially_paid);

        let paid = DueStatement::calculate(price, price, zero);
        assert_eq!(paid.status, DueStatus::Paid);
    }

    #[test]
    fn statement_serializes_both_status_and_partial_flag() {
        let statement = DueStatement::calculate(
            Money::inr(dec!(9500)),
            Money::inr(dec!(5000)),
            Money::inr(dec!(0)),
        );
        let json = serde_json::to_value(&statement).unwrap();

        assert_eq!(json["status"], "Unpaid");
        assert_eq!(json["is_partially_paid"], true);
        assert_eq!(json["is_fully_paid"], false);
    }
}

// ============================================================================
// Settlement Tests
// ============================================================================

mod settlement_tests {
    use super::*;

    #[test]
    fn settlement_round_trips_through_json() {
        let settlement = Settlement::new(
            NewSettlement {
                resident_id: ResidentId::new_v7(),
                period: "April 2025".parse().unwrap(),
                amount: Money::inr(dec!(4500)),
                reason: SettlementReason::MidMonthEntry,
                remarks: Some("joined on the 14th".to_string()),
            },
            "admin".to_string(),
        )
        .unwrap();

        let json = serde_json::to_string(&settlement).unwrap();
        assert!(json.contains("mid_month_entry"));

        let back: Settlement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.settlement_id, settlement.settlement_id);
        assert_eq!(back.reason, SettlementReason::MidMonthEntry);
    }

    #[test]
    fn all_reasons_parse_from_storage_form() {
        for reason in [
            SettlementReason::MidMonthEntry,
            SettlementReason::SpecialDiscount,
            SettlementReason::Compensation,
            SettlementReason::AdminDiscretion,
            SettlementReason::Other,
        ] {
            let parsed: SettlementReason = reason.as_str().parse().unwrap();
            assert_eq!(parsed, reason);
        }
    }
}
