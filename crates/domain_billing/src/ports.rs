//! Billing Domain Ports
//!
//! Port interfaces for the billing domain. The PostgreSQL adapters live in
//! `infra_db`; in-memory mocks back the service tests.
//!
//! The two invariant-bearing writes are atomic at the port:
//!
//! - `create_payment` is backstopped by a uniqueness constraint over
//!   `(resident, period)` for active non-deposit payments, so two
//!   concurrent writers can never double-book a period even if both passed
//!   the pre-check.
//! - `create_settlement_checked` is one conditional write: the due ceiling
//!   is evaluated and the row inserted in a single atomic step, closing the
//!   window between validation and commit.

use async_trait::async_trait;
use core_kernel::{BillingPeriod, DomainPort, Money, PaymentId, PortError, ResidentId};

use crate::payment::{Payment, PaymentStatus};
use crate::settlement::Settlement;

/// Who is asking, as resolved by the identity gate
///
/// Listing payments is role-scoped: admins see everything and may filter
/// freely; a resident only ever sees their own records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerScope {
    Admin,
    Resident(ResidentId),
}

/// Query parameters for listing payments
#[derive(Debug, Clone, Default)]
pub struct PaymentQuery {
    /// Filter by resident
    pub resident_id: Option<ResidentId>,
    /// Filter by payment status
    pub status: Option<PaymentStatus>,
    /// Filter by covered billing period
    pub period: Option<BillingPeriod>,
    /// Restrict to deposit or rent payments
    pub is_deposit: Option<bool>,
    /// Include archived payments (default queries exclude them)
    pub include_archived: bool,
}

/// Port for the payment ledger
#[async_trait]
pub trait PaymentPort: DomainPort {
    /// Persists a new payment
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if a uniqueness backstop fires for one of the
    /// covered periods.
    async fn create_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Retrieves an active payment by id
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    /// Writes back a payment's mutable fields
    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Archives a payment; its receipt number is never reused
    async fn archive_payment(&self, id: PaymentId) -> Result<(), PortError>;

    /// Lists payments matching the query
    async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Payment>, PortError>;

    /// Periods among `periods` already covered by an active non-deposit
    /// payment of the resident, excluding `exclude` when editing
    async fn conflicting_periods(
        &self,
        resident_id: ResidentId,
        periods: &[BillingPeriod],
        exclude: Option<PaymentId>,
    ) -> Result<Vec<BillingPeriod>, PortError>;
}

/// Port for the settlement register
#[async_trait]
pub trait SettlementPort: DomainPort {
    /// Atomically validates and inserts a settlement
    ///
    /// The adapter recomputes `effective_due = room_price - total_paid -
    /// total_settled` for the settlement's `(resident, period)` and inserts
    /// only while `0 < amount <= effective_due`, all in one atomic step.
    ///
    /// # Errors
    ///
    /// - `PortError::Conflict` when the ceiling check fails (another
    ///   settlement won the race) or an exact active duplicate exists.
    async fn create_settlement_checked(
        &self,
        settlement: &Settlement,
        room_price: Money,
    ) -> Result<(), PortError>;

    /// Active settlements of a resident, newest first
    async fn list_settlements(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<Settlement>, PortError>;

    /// Active settlements of a resident for one period
    async fn list_for_period(
        &self,
        resident_id: ResidentId,
        period: &BillingPeriod,
    ) -> Result<Vec<Settlement>, PortError>;
}

/// In-memory adapter implementing the billing ports for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    struct State {
        payments: HashMap<PaymentId, Payment>,
        settlements: Vec<Settlement>,
    }

    /// In-memory mock backing `PaymentPort` and `SettlementPort`
    #[derive(Debug, Default, Clone)]
    pub struct MockBillingAdapter {
        state: Arc<RwLock<State>>,
    }

    impl MockBillingAdapter {
        /// Creates an empty mock
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of a payment for assertions
        pub async fn payment_snapshot(&self, id: PaymentId) -> Option<Payment> {
            self.state.read().await.payments.get(&id).cloned()
        }
    }

    impl DomainPort for MockBillingAdapter {}

    fn conflicts_in(
        payments: &HashMap<PaymentId, Payment>,
        resident_id: ResidentId,
        periods: &[BillingPeriod],
        exclude: Option<PaymentId>,
    ) -> Vec<BillingPeriod> {
        let mut conflicting: Vec<BillingPeriod> = periods
            .iter()
            .filter(|period| {
                payments.values().any(|p| {
                    p.lifecycle.is_active()
                        && !p.is_deposit
                        && p.resident_id == resident_id
                        && Some(p.payment_id) != exclude
                        && p.covers(period)
                })
            })
            .cloned()
            .collect();
        conflicting.dedup();
        conflicting
    }

    #[async_trait]
    impl PaymentPort for MockBillingAdapter {
        async fn create_payment(&self, payment: &Payment) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if !payment.is_deposit {
                let conflicts = conflicts_in(
                    &state.payments,
                    payment.resident_id,
                    &payment.periods,
                    None,
                );
                if !conflicts.is_empty() {
                    return Err(PortError::conflict(format!(
                        "Payment already exists for: {}",
                        conflicts
                            .iter()
                            .map(|p| p.as_str().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )));
                }
            }
            state.payments.insert(payment.payment_id, payment.clone());
            Ok(())
        }

        async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
            self.state
                .read()
                .await
                .payments
                .get(&id)
                .filter(|p| p.lifecycle.is_active())
                .cloned()
                .ok_or_else(|| PortError::not_found("Payment", id))
        }

        async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if !payment.is_deposit {
                let conflicts = conflicts_in(
                    &state.payments,
                    payment.resident_id,
                    &payment.periods,
                    Some(payment.payment_id),
                );
                if !conflicts.is_empty() {
                    return Err(PortError::conflict(format!(
                        "Payment already exists for: {}",
                        conflicts
                            .iter()
                            .map(|p| p.as_str().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )));
                }
            }
            let existing = state
                .payments
                .get_mut(&payment.payment_id)
                .filter(|p| p.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Payment", payment.payment_id))?;
            *existing = payment.clone();
            Ok(())
        }

        async fn archive_payment(&self, id: PaymentId) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let payment = state
                .payments
                .get_mut(&id)
                .filter(|p| p.lifecycle.is_active())
                .ok_or_else(|| PortError::not_found("Payment", id))?;
            payment.lifecycle = core_kernel::Lifecycle::Archived;
            Ok(())
        }

        async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Payment>, PortError> {
            let state = self.state.read().await;
            let mut payments: Vec<Payment> = state
                .payments
                .values()
                .filter(|p| query.include_archived || p.lifecycle.is_active())
                .filter(|p| query.resident_id.map_or(true, |r| p.resident_id == r))
                .filter(|p| query.status.map_or(true, |s| p.status == s))
                .filter(|p| query.is_deposit.map_or(true, |d| p.is_deposit == d))
                .filter(|p| query.period.as_ref().map_or(true, |m| p.covers(m)))
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            Ok(payments)
        }

        async fn conflicting_periods(
            &self,
            resident_id: ResidentId,
            periods: &[BillingPeriod],
            exclude: Option<PaymentId>,
        ) -> Result<Vec<BillingPeriod>, PortError> {
            let state = self.state.read().await;
            Ok(conflicts_in(&state.payments, resident_id, periods, exclude))
        }
    }

    #[async_trait]
    impl SettlementPort for MockBillingAdapter {
        async fn create_settlement_checked(
            &self,
            settlement: &Settlement,
            room_price: Money,
        ) -> Result<(), PortError> {
            // The write lock is held across check and insert, matching the
            // single conditional statement of the SQL adapter.
            let mut state = self.state.write().await;

            if state.settlements.iter().any(|s| s.duplicates(settlement)) {
                return Err(PortError::conflict(format!(
                    "An identical settlement already exists for {}",
                    settlement.period
                )));
            }

            let total_paid = state
                .payments
                .values()
                .filter(|p| {
                    p.resident_id == settlement.resident_id
                        && p.counts_toward_due(&settlement.period)
                })
                .fold(Money::zero(room_price.currency()), |acc, p| acc + p.amount);
            let total_settled = state
                .settlements
                .iter()
                .filter(|s| {
                    s.lifecycle.is_active()
                        && s.resident_id == settlement.resident_id
                        && s.period == settlement.period
                })
                .fold(Money::zero(room_price.currency()), |acc, s| acc + s.amount);

            let effective_due =
                (room_price - total_paid - total_settled).or_zero_if_negative();
            if !effective_due.is_positive()
                || settlement.amount.amount() > effective_due.amount()
            {
                return Err(PortError::conflict(format!(
                    "Settlement of {} rejected: outstanding due is {}",
                    settlement.amount, effective_due
                )));
            }

            state.settlements.push(settlement.clone());
            Ok(())
        }

        async fn list_settlements(
            &self,
            resident_id: ResidentId,
        ) -> Result<Vec<Settlement>, PortError> {
            let state = self.state.read().await;
            let mut settlements: Vec<Settlement> = state
                .settlements
                .iter()
                .filter(|s| s.lifecycle.is_active() && s.resident_id == resident_id)
                .cloned()
                .collect();
            settlements.sort_by(|a, b| b.settled_at.cmp(&a.settled_at));
            Ok(settlements)
        }

        async fn list_for_period(
            &self,
            resident_id: ResidentId,
            period: &BillingPeriod,
        ) -> Result<Vec<Settlement>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .settlements
                .iter()
                .filter(|s| {
                    s.lifecycle.is_active()
                        && s.resident_id == resident_id
                        && &s.period == period
                })
                .cloned()
                .collect())
        }
    }
}
