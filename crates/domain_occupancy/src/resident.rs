//! Resident entity
//!
//! A resident optionally holds one bed in one room. Registration begins
//! Pending and flips to Approved when the security deposit is recorded.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Currency, Lifecycle, Money, ResidentId, RoomId};
use serde::{Deserialize, Serialize};

use crate::error::OccupancyError;

/// Registration approval state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
        }
    }
}

/// A resident record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub resident_id: ResidentId,
    pub name: String,
    pub email: String,
    /// Room currently held, if any
    pub room_id: Option<RoomId>,
    /// Bed ordinal within the room, `1..=capacity`
    pub bed_number: Option<i16>,
    pub approval: ApprovalStatus,
    pub on_notice_period: bool,
    pub last_staying_date: Option<NaiveDate>,
    /// Total security deposit recorded so far
    pub deposit_fees: Money,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resident {
    /// Creates a new, unassigned resident with a Pending registration
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            resident_id: ResidentId::new_v7(),
            name: name.into(),
            email: email.into(),
            room_id: None,
            bed_number: None,
            approval: ApprovalStatus::Pending,
            on_notice_period: false,
            last_staying_date: None,
            deposit_fees: Money::zero(Currency::INR),
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true when the resident currently holds a bed
    pub fn is_assigned(&self) -> bool {
        self.room_id.is_some()
    }

    /// Binds the resident to a room and bed
    ///
    /// # Errors
    ///
    /// Returns an error if a room is already assigned; a transfer must go
    /// through the reassignment transaction instead.
    pub fn assign(&mut self, room_id: RoomId, bed_number: i16) -> Result<(), OccupancyError> {
        if self.is_assigned() {
            return Err(OccupancyError::ResidentAlreadyAssigned(
                self.resident_id.to_string(),
            ));
        }
        self.room_id = Some(room_id);
        self.bed_number = Some(bed_number);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Releases the held bed, stamping the last staying date
    pub fn vacate(&mut self, last_staying_date: NaiveDate) -> Result<(), OccupancyError> {
        if !self.is_assigned() {
            return Err(OccupancyError::ResidentUnassigned(
                self.resident_id.to_string(),
            ));
        }
        self.room_id = None;
        self.bed_number = None;
        self.on_notice_period = false;
        self.last_staying_date = Some(last_staying_date);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves the resident to a different room, used inside the transfer commit
    pub fn relocate(&mut self, room_id: RoomId, bed_number: i16) -> Result<(), OccupancyError> {
        if !self.is_assigned() {
            return Err(OccupancyError::ResidentUnassigned(
                self.resident_id.to_string(),
            ));
        }
        self.room_id = Some(room_id);
        self.bed_number = Some(bed_number);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Adds a deposit amount; an approved registration stays approved
    pub fn add_deposit(&mut self, amount: Money) -> Result<(), OccupancyError> {
        if !amount.is_positive() {
            return Err(OccupancyError::validation("Deposit amount must be positive"));
        }
        self.deposit_fees = self
            .deposit_fees
            .checked_add(&amount)
            .map_err(|e| OccupancyError::validation(e.to_string()))?;
        self.approval = ApprovalStatus::Approved;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_resident_is_pending_and_unassigned() {
        let resident = Resident::new("Asha Verma", "asha@example.com");
        assert_eq!(resident.approval, ApprovalStatus::Pending);
        assert!(!resident.is_assigned());
        assert!(resident.deposit_fees.is_zero());
    }

    #[test]
    fn test_assign_and_vacate() {
        let mut resident = Resident::new("Asha Verma", "asha@example.com");
        let room_id = RoomId::new_v7();

        resident.assign(room_id, 1).unwrap();
        assert_eq!(resident.room_id, Some(room_id));
        assert_eq!(resident.bed_number, Some(1));

        // Double-assignment must go through a transfer
        assert!(matches!(
            resident.assign(RoomId::new_v7(), 2),
            Err(OccupancyError::ResidentAlreadyAssigned(_))
        ));

        let leave = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        resident.vacate(leave).unwrap();
        assert!(!resident.is_assigned());
        assert_eq!(resident.last_staying_date, Some(leave));
    }

    #[test]
    fn test_vacate_requires_assignment() {
        let mut resident = Resident::new("Asha Verma", "asha@example.com");
        let leave = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        assert!(matches!(
            resident.vacate(leave),
            Err(OccupancyError::ResidentUnassigned(_))
        ));
    }

    #[test]
    fn test_deposit_approves_pending_registration() {
        let mut resident = Resident::new("Asha Verma", "asha@example.com");
        resident.add_deposit(Money::inr(dec!(5000))).unwrap();

        assert_eq!(resident.approval, ApprovalStatus::Approved);
        assert_eq!(resident.deposit_fees, Money::inr(dec!(5000)));

        // Deposits accumulate
        resident.add_deposit(Money::inr(dec!(1000))).unwrap();
        assert_eq!(resident.deposit_fees, Money::inr(dec!(6000)));
    }

    #[test]
    fn test_deposit_must_be_positive() {
        let mut resident = Resident::new("Asha Verma", "asha@example.com");
        assert!(resident.add_deposit(Money::inr(dec!(0))).is_err());
    }
}
