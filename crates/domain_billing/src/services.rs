//! Billing domain services
//!
//! Services orchestrate the ports: friendly validation happens up front,
//! and every invariant-bearing write still goes through an atomic port
//! operation so a concurrent writer can never slip between validation and
//! commit.

use core_kernel::{BillingPeriod, PaymentId, ResidentId};
use domain_occupancy::ports::{ResidentPort, RoomPort};
use std::sync::Arc;
use tracing::info;

use crate::dues::{DueStatement, ResidentDue};
use crate::error::BillingError;
use crate::payment::{NewPayment, Payment, PaymentUpdate};
use crate::ports::{CallerScope, PaymentPort, PaymentQuery, SettlementPort};
use crate::receipt::ReceiptNumbers;
use crate::settlement::{NewSettlement, Settlement, SettlementOutcome};

/// Service over the payment ledger
pub struct PaymentLedgerService {
    payments: Arc<dyn PaymentPort>,
    residents: Arc<dyn ResidentPort>,
    receipts: ReceiptNumbers,
}

impl PaymentLedgerService {
    /// Creates the service over its ports
    pub fn new(
        payments: Arc<dyn PaymentPort>,
        residents: Arc<dyn ResidentPort>,
        receipts: ReceiptNumbers,
    ) -> Self {
        Self {
            payments,
            residents,
            receipts,
        }
    }

    /// Records a payment
    ///
    /// For rent payments, every requested period must be free of active
    /// non-deposit payments; conflicts are rejected naming the months. The
    /// receipt number is obtained from the sequence generator before the
    /// record persists. A deposit payment additionally adds to the
    /// resident's deposit total and approves a pending registration.
    pub async fn record_payment(&self, input: NewPayment) -> Result<Payment, BillingError> {
        // The resident must exist; NotFound propagates as-is
        let _ = self.residents.get_resident(input.resident_id).await?;

        if !input.is_deposit {
            let conflicts = self
                .payments
                .conflicting_periods(input.resident_id, &input.periods, None)
                .await?;
            if !conflicts.is_empty() {
                return Err(BillingError::PeriodsAlreadyCovered(
                    conflicts.iter().map(|p| p.as_str().to_string()).collect(),
                ));
            }
        }

        let receipt_number = self.receipts.next().await?;
        let payment = Payment::new(input, receipt_number)?;
        self.payments.create_payment(&payment).await?;

        if payment.is_deposit {
            self.residents
                .add_deposit(payment.resident_id, payment.amount)
                .await?;
        }

        info!(
            receipt = %payment.receipt_number,
            resident = %payment.resident_id,
            amount = %payment.amount,
            deposit = payment.is_deposit,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Updates a payment's status, remarks, or covered periods
    ///
    /// A period change re-runs the double-booking check excluding the
    /// record being edited.
    pub async fn update_payment(
        &self,
        id: PaymentId,
        update: PaymentUpdate,
    ) -> Result<Payment, BillingError> {
        let mut payment = self.payments.get_payment(id).await?;

        if let Some(ref periods) = update.periods {
            if !payment.is_deposit {
                let conflicts = self
                    .payments
                    .conflicting_periods(payment.resident_id, periods, Some(id))
                    .await?;
                if !conflicts.is_empty() {
                    return Err(BillingError::PeriodsAlreadyCovered(
                        conflicts.iter().map(|p| p.as_str().to_string()).collect(),
                    ));
                }
            }
        }

        payment.apply_update(update)?;
        self.payments.update_payment(&payment).await?;
        Ok(payment)
    }

    /// Archives a payment; the receipt number is never reused
    pub async fn deactivate_payment(&self, id: PaymentId) -> Result<(), BillingError> {
        self.payments.archive_payment(id).await?;
        Ok(())
    }

    /// Lists payments, scoped by the caller's role
    ///
    /// A resident caller always sees exactly their own records, whatever
    /// the query says; admins may filter freely.
    pub async fn list_payments(
        &self,
        mut query: PaymentQuery,
        caller: &CallerScope,
    ) -> Result<Vec<Payment>, BillingError> {
        if let CallerScope::Resident(resident_id) = caller {
            query.resident_id = Some(*resident_id);
            query.include_archived = false;
        }
        Ok(self.payments.list_payments(query).await?)
    }
}

/// Read-side service deriving dues from current ledger state
pub struct DueService {
    payments: Arc<dyn PaymentPort>,
    settlements: Arc<dyn SettlementPort>,
    rooms: Arc<dyn RoomPort>,
    residents: Arc<dyn ResidentPort>,
}

impl DueService {
    /// Creates the service over its ports
    pub fn new(
        payments: Arc<dyn PaymentPort>,
        settlements: Arc<dyn SettlementPort>,
        rooms: Arc<dyn RoomPort>,
        residents: Arc<dyn ResidentPort>,
    ) -> Self {
        Self {
            payments,
            settlements,
            rooms,
            residents,
        }
    }

    /// Derives the due statement for one `(resident, period)`
    ///
    /// A resident without a room yields an `N/A` statement with a zero due.
    pub async fn statement_for(
        &self,
        resident_id: ResidentId,
        period: &BillingPeriod,
    ) -> Result<DueStatement, BillingError> {
        let resident = self.residents.get_resident(resident_id).await?;
        let Some(room_id) = resident.room_id else {
            return Ok(DueStatement::not_applicable());
        };
        let room = self.rooms.get_room(room_id).await?;

        let payments = self
            .payments
            .list_payments(PaymentQuery {
                resident_id: Some(resident_id),
                period: Some(period.clone()),
                is_deposit: Some(false),
                ..Default::default()
            })
            .await?;
        let settlements = self
            .settlements
            .list_for_period(resident_id, period)
            .await?;

        Ok(DueStatement::from_records(
            room.price,
            period,
            &payments,
            &settlements,
        ))
    }

    /// Derives due statements for a list of residents against one period
    pub async fn batch_statements(
        &self,
        period: &BillingPeriod,
        resident_ids: &[ResidentId],
    ) -> Result<Vec<ResidentDue>, BillingError> {
        let mut result = Vec::with_capacity(resident_ids.len());
        for &resident_id in resident_ids {
            let resident = self.residents.get_resident(resident_id).await?;
            let statement = self.statement_for(resident_id, period).await?;
            result.push(ResidentDue {
                resident_id,
                room_id: resident.room_id,
                period: period.clone(),
                statement,
            });
        }
        Ok(result)
    }
}

/// Service over the settlement register
pub struct SettlementService {
    settlements: Arc<dyn SettlementPort>,
    rooms: Arc<dyn RoomPort>,
    residents: Arc<dyn ResidentPort>,
    dues: Arc<DueService>,
}

impl SettlementService {
    /// Creates the service over its ports
    pub fn new(
        settlements: Arc<dyn SettlementPort>,
        rooms: Arc<dyn RoomPort>,
        residents: Arc<dyn ResidentPort>,
        dues: Arc<DueService>,
    ) -> Self {
        Self {
            settlements,
            rooms,
            residents,
            dues,
        }
    }

    /// Records a discretionary settlement
    ///
    /// The due ceiling is validated twice: once here for a friendly error,
    /// and again inside the port's conditional write, which is the
    /// authoritative check under concurrency.
    pub async fn record_settlement(
        &self,
        input: NewSettlement,
        settled_by: String,
    ) -> Result<SettlementOutcome, BillingError> {
        let resident = self.residents.get_resident(input.resident_id).await?;
        let Some(room_id) = resident.room_id else {
            return Err(BillingError::NoRoomAssigned(input.resident_id.to_string()));
        };
        let room = self.rooms.get_room(room_id).await?;
        if !room.price.is_positive() {
            return Err(BillingError::validation(
                "Room has no positive price; nothing to settle against",
            ));
        }

        let statement = self
            .dues
            .statement_for(input.resident_id, &input.period)
            .await?;
        if !statement.effective_due.is_positive() {
            return Err(BillingError::NoDueAmount {
                period: input.period.to_string(),
            });
        }
        if input.amount.amount() > statement.effective_due.amount() {
            return Err(BillingError::ExceedsDue {
                requested: input.amount,
                due: statement.effective_due,
            });
        }

        let existing = self
            .settlements
            .list_for_period(input.resident_id, &input.period)
            .await?;
        let candidate = Settlement::new(input, settled_by)?;
        if existing.iter().any(|s| s.duplicates(&candidate)) {
            return Err(BillingError::DuplicateSettlement {
                period: candidate.period.to_string(),
            });
        }

        // Authoritative conditional write; a racing settlement surfaces as
        // a conflict here even though the pre-check above passed.
        self.settlements
            .create_settlement_checked(&candidate, room.price)
            .await?;

        let remaining_due = (statement.effective_due - candidate.amount).or_zero_if_negative();
        info!(
            resident = %candidate.resident_id,
            period = %candidate.period,
            amount = %candidate.amount,
            remaining = %remaining_due,
            "settlement recorded"
        );

        Ok(SettlementOutcome {
            settlement: candidate,
            remaining_due,
        })
    }

    /// Active settlements of a resident, newest first
    pub async fn list_settlements(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<Settlement>, BillingError> {
        Ok(self.settlements.list_settlements(resident_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{PaymentMethod, PaymentStatus};
    use core_kernel::Money;
    use crate::ports::mock::MockBillingAdapter;
    use crate::receipt::mock::MockSequence;
    use crate::settlement::SettlementReason;
    use domain_occupancy::ports::mock::MockOccupancyAdapter;
    use domain_occupancy::room::{Building, NewRoom, RoomType};
    use domain_occupancy::{Resident, RoomDirectoryService};
    use rust_decimal_macros::dec;

    struct Harness {
        occupancy: MockOccupancyAdapter,
        billing: MockBillingAdapter,
        ledger: PaymentLedgerService,
        dues: Arc<DueService>,
        settlements: SettlementService,
    }

    impl Harness {
        fn new() -> Self {
            let occupancy = MockOccupancyAdapter::new();
            let billing = MockBillingAdapter::new();
            let receipts = ReceiptNumbers::new(Arc::new(MockSequence::new()));

            let ledger = PaymentLedgerService::new(
                Arc::new(billing.clone()),
                Arc::new(occupancy.clone()),
                receipts,
            );
            let dues = Arc::new(DueService::new(
                Arc::new(billing.clone()),
                Arc::new(billing.clone()),
                Arc::new(occupancy.clone()),
                Arc::new(occupancy.clone()),
            ));
            let settlements = SettlementService::new(
                Arc::new(billing.clone()),
                Arc::new(occupancy.clone()),
                Arc::new(occupancy.clone()),
                dues.clone(),
            );

            Self {
                occupancy,
                billing,
                ledger,
                dues,
                settlements,
            }
        }

        /// Seeds a room with one assigned resident, returning the resident id
        async fn assigned_resident(&self, price: i64) -> ResidentId {
            let directory = RoomDirectoryService::new(
                Arc::new(self.occupancy.clone()),
                Arc::new(self.occupancy.clone()),
            );
            let room = directory
                .create_room(NewRoom {
                    building: Building::A,
                    floor: 1,
                    room_number: format!("10{}", price % 10),
                    room_type: RoomType::Double,
                    price: Money::inr(rust_decimal::Decimal::new(price, 0)),
                    capacity: 2,
                    amenities: vec![],
                })
                .await
                .unwrap();
            let resident = Resident::new("Asha Verma", "asha@example.com");
            self.occupancy.seed_resident(resident.clone()).await;
            directory
                .assign_resident(resident.resident_id, room.room_id)
                .await
                .unwrap();
            resident.resident_id
        }

        fn rent(&self, resident_id: ResidentId, amount: i64, periods: &[&str]) -> NewPayment {
            NewPayment {
                resident_id,
                amount: Money::inr(rust_decimal::Decimal::new(amount, 0)),
                periods: periods.iter().map(|p| p.parse().unwrap()).collect(),
                due_date: None,
                status: PaymentStatus::Paid,
                method: PaymentMethod::Upi,
                transaction_ref: None,
                remarks: None,
                is_deposit: false,
            }
        }
    }

    #[tokio::test]
    async fn test_first_payment_gets_receipt_c00001() {
        let h = Harness::new();
        let resident = h.assigned_resident(8000).await;

        let payment = h
            .ledger
            .record_payment(h.rent(resident, 8000, &["March 2025"]))
            .await
            .unwrap();

        assert_eq!(payment.receipt_number, "C00001");
    }

    #[tokio::test]
    async fn test_double_booking_rejected_naming_months() {
        let h = Harness::new();
        let resident = h.assigned_resident(8000).await;

        h.ledger
            .record_payment(h.rent(resident, 8000, &["March 2025"]))
            .await
            .unwrap();

        let err = h
            .ledger
            .record_payment(h.rent(resident, 8000, &["March 2025", "April 2025"]))
            .await
            .unwrap_err();

        match err {
            BillingError::PeriodsAlreadyCovered(months) => {
                assert_eq!(months, vec!["March 2025".to_string()]);
            }
            other => panic!("expected PeriodsAlreadyCovered, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_deposit_does_not_double_book_and_approves() {
        let h = Harness::new();
        let resident_id = h.assigned_resident(8000).await;

        h.ledger
            .record_payment(h.rent(resident_id, 8000, &["March 2025"]))
            .await
            .unwrap();

        let mut deposit = h.rent(resident_id, 5000, &["March 2025"]);
        deposit.is_deposit = true;
        h.ledger.record_payment(deposit).await.unwrap();

        let resident = h
            .occupancy
            .resident_snapshot(resident_id)
            .await
            .unwrap();
        assert_eq!(resident.deposit_fees, Money::inr(dec!(5000)));
        assert_eq!(
            resident.approval,
            domain_occupancy::ApprovalStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_update_payment_revalidates_periods() {
        let h = Harness::new();
        let resident = h.assigned_resident(8000).await;

        let march = h
            .ledger
            .record_payment(h.rent(resident, 8000, &["March 2025"]))
            .await
            .unwrap();
        let _april = h
            .ledger
            .record_payment(h.rent(resident, 8000, &["April 2025"]))
            .await
            .unwrap();

        // Moving March onto April collides
        let err = h
            .ledger
            .update_payment(
                march.payment_id,
                PaymentUpdate {
                    periods: Some(vec!["April 2025".parse().unwrap()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::PeriodsAlreadyCovered(_)));

        // Re-saving its own period is not a self-conflict
        h.ledger
            .update_payment(
                march.payment_id,
                PaymentUpdate {
                    periods: Some(vec!["March 2025".parse().unwrap()]),
                    status: Some(PaymentStatus::Paid),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_deactivated_payment_frees_period_but_not_receipt() {
        let h = Harness::new();
        let resident = h.assigned_resident(8000).await;

        let first = h
            .ledger
            .record_payment(h.rent(resident, 8000, &["March 2025"]))
            .await
            .unwrap();
        h.ledger.deactivate_payment(first.payment_id).await.unwrap();

        let second = h
            .ledger
            .record_payment(h.rent(resident, 8000, &["March 2025"]))
            .await
            .unwrap();
        // The period is bookable again; the receipt number moves on
        assert_eq!(second.receipt_number, "C00002");
    }

    #[tokio::test]
    async fn test_role_scoped_listing() {
        let h = Harness::new();
        let alice = h.assigned_resident(8000).await;
        let bob_resident = Resident::new("Bob", "bob@example.com");
        h.occupancy.seed_resident(bob_resident.clone()).await;
        let bob = bob_resident.resident_id;

        h.ledger
            .record_payment(h.rent(alice, 8000, &["March 2025"]))
            .await
            .unwrap();
        h.ledger
            .record_payment(h.rent(bob, 8000, &["March 2025"]))
            .await
            .unwrap();

        // A resident caller cannot widen the query onto someone else
        let seen = h
            .ledger
            .list_payments(
                PaymentQuery {
                    resident_id: Some(alice),
                    ..Default::default()
                },
                &CallerScope::Resident(bob),
            )
            .await
            .unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].resident_id, bob);

        let all = h
            .ledger
            .list_payments(PaymentQuery::default(), &CallerScope::Admin)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_settlement_scenario_from_partial_payment() {
        // Room price 9500; Paid 5000 for April 2025 -> due 4500
        let h = Harness::new();
        let resident = h.assigned_resident(9500).await;
        let period: BillingPeriod = "April 2025".parse().unwrap();

        h.ledger
            .record_payment(h.rent(resident, 5000, &["April 2025"]))
            .await
            .unwrap();

        let statement = h.dues.statement_for(resident, &period).await.unwrap();
        assert_eq!(statement.effective_due, Money::inr(dec!(4500)));
        assert!(statement.is_partially_paid);

        let outcome = h
            .settlements
            .record_settlement(
                NewSettlement {
                    resident_id: resident,
                    period: period.clone(),
                    amount: Money::inr(dec!(4500)),
                    reason: SettlementReason::AdminDiscretion,
                    remarks: None,
                },
                "admin".to_string(),
            )
            .await
            .unwrap();
        assert!(outcome.remaining_due.is_zero());

        // A further settlement of 1 finds no due left
        let err = h
            .settlements
            .record_settlement(
                NewSettlement {
                    resident_id: resident,
                    period: period.clone(),
                    amount: Money::inr(dec!(1)),
                    reason: SettlementReason::Other,
                    remarks: None,
                },
                "admin".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::NoDueAmount { .. }));
    }

    #[tokio::test]
    async fn test_settlement_cannot_exceed_due() {
        let h = Harness::new();
        let resident = h.assigned_resident(9500).await;
        let period: BillingPeriod = "April 2025".parse().unwrap();

        h.ledger
            .record_payment(h.rent(resident, 5000, &["April 2025"]))
            .await
            .unwrap();

        let err = h
            .settlements
            .record_settlement(
                NewSettlement {
                    resident_id: resident,
                    period,
                    amount: Money::inr(dec!(5000)),
                    reason: SettlementReason::SpecialDiscount,
                    remarks: None,
                },
                "admin".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::ExceedsDue { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_settlement_rejected() {
        let h = Harness::new();
        let resident = h.assigned_resident(9500).await;
        let period: BillingPeriod = "April 2025".parse().unwrap();

        let input = NewSettlement {
            resident_id: resident,
            period,
            amount: Money::inr(dec!(1000)),
            reason: SettlementReason::Compensation,
            remarks: None,
        };
        h.settlements
            .record_settlement(input.clone(), "admin".to_string())
            .await
            .unwrap();

        let err = h
            .settlements
            .record_settlement(input, "admin".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::DuplicateSettlement { .. }));
    }

    #[tokio::test]
    async fn test_settlement_requires_room() {
        let h = Harness::new();
        let unassigned = Resident::new("Nomad", "nomad@example.com");
        h.occupancy.seed_resident(unassigned.clone()).await;

        let err = h
            .settlements
            .record_settlement(
                NewSettlement {
                    resident_id: unassigned.resident_id,
                    period: "April 2025".parse().unwrap(),
                    amount: Money::inr(dec!(100)),
                    reason: SettlementReason::Other,
                    remarks: None,
                },
                "admin".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::NoRoomAssigned(_)));
    }

    #[tokio::test]
    async fn test_batch_dues_handle_unassigned_residents() {
        let h = Harness::new();
        let assigned = h.assigned_resident(9500).await;
        let nomad = Resident::new("Nomad", "nomad@example.com");
        h.occupancy.seed_resident(nomad.clone()).await;
        let period: BillingPeriod = "April 2025".parse().unwrap();

        let batch = h
            .dues
            .batch_statements(&period, &[assigned, nomad.resident_id])
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].statement.effective_due, Money::inr(dec!(9500)));
        assert_eq!(
            batch[1].statement.status,
            crate::dues::DueStatus::NotApplicable
        );
        assert!(batch[1].statement.effective_due.is_zero());
    }
}
