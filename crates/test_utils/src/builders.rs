//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the relevant fields and take defaults for the rest.

use core_kernel::{BillingPeriod, Money, ResidentId};
use domain_billing::payment::{NewPayment, PaymentMethod, PaymentStatus};
use domain_billing::settlement::{NewSettlement, SettlementReason};
use domain_occupancy::room::{Building, NewRoom, RoomType};
use domain_occupancy::Resident;

use crate::fixtures::{MoneyFixtures, PeriodFixtures, PersonFixtures};

/// Builder for room creation input
pub struct RoomBuilder {
    building: Building,
    floor: i16,
    room_number: String,
    room_type: RoomType,
    price: Money,
    capacity: i16,
    amenities: Vec<String>,
}

impl Default for RoomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomBuilder {
    /// Creates a builder with default values
    pub fn new() -> Self {
        Self {
            building: Building::A,
            floor: 2,
            room_number: "201".to_string(),
            room_type: RoomType::Double,
            price: MoneyFixtures::rent(),
            capacity: 2,
            amenities: vec!["wifi".to_string()],
        }
    }

    pub fn in_building(mut self, building: Building) -> Self {
        self.building = building;
        self
    }

    pub fn on_floor(mut self, floor: i16) -> Self {
        self.floor = floor;
        self
    }

    pub fn numbered(mut self, number: impl Into<String>) -> Self {
        self.room_number = number.into();
        self
    }

    pub fn of_type(mut self, room_type: RoomType) -> Self {
        self.room_type = room_type;
        self
    }

    pub fn priced(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    pub fn with_capacity(mut self, capacity: i16) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the room creation input
    pub fn build(self) -> NewRoom {
        NewRoom {
            building: self.building,
            floor: self.floor,
            room_number: self.room_number,
            room_type: self.room_type,
            price: self.price,
            capacity: self.capacity,
            amenities: self.amenities,
        }
    }
}

/// Builder for residents
pub struct ResidentBuilder {
    name: String,
    email: String,
}

impl Default for ResidentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResidentBuilder {
    /// Creates a builder with a random realistic identity
    pub fn new() -> Self {
        Self {
            name: PersonFixtures::name(),
            email: PersonFixtures::email(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the resident
    pub fn build(self) -> Resident {
        Resident::new(self.name, self.email)
    }
}

/// Builder for payment input
pub struct PaymentBuilder {
    resident_id: ResidentId,
    amount: Money,
    periods: Vec<BillingPeriod>,
    status: PaymentStatus,
    method: PaymentMethod,
    is_deposit: bool,
}

impl PaymentBuilder {
    /// Creates a builder for a Paid rent payment covering March 2025
    pub fn rent_for(resident_id: ResidentId) -> Self {
        Self {
            resident_id,
            amount: MoneyFixtures::rent(),
            periods: vec![PeriodFixtures::march()],
            status: PaymentStatus::Paid,
            method: PaymentMethod::Upi,
            is_deposit: false,
        }
    }

    /// Creates a builder for a security deposit
    pub fn deposit_for(resident_id: ResidentId) -> Self {
        Self {
            resident_id,
            amount: MoneyFixtures::deposit(),
            periods: vec![],
            status: PaymentStatus::Paid,
            method: PaymentMethod::BankTransfer,
            is_deposit: true,
        }
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn covering(mut self, periods: Vec<BillingPeriod>) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    /// Builds the payment input
    pub fn build(self) -> NewPayment {
        NewPayment {
            resident_id: self.resident_id,
            amount: self.amount,
            periods: self.periods,
            due_date: None,
            status: self.status,
            method: self.method,
            transaction_ref: None,
            remarks: None,
            is_deposit: self.is_deposit,
        }
    }
}

/// Builder for settlement input
pub struct SettlementBuilder {
    resident_id: ResidentId,
    period: BillingPeriod,
    amount: Money,
    reason: SettlementReason,
    remarks: Option<String>,
}

impl SettlementBuilder {
    /// Creates a builder for an admin-discretion settlement
    pub fn for_resident(resident_id: ResidentId) -> Self {
        Self {
            resident_id,
            period: PeriodFixtures::march(),
            amount: MoneyFixtures::partial_payment(),
            reason: SettlementReason::AdminDiscretion,
            remarks: None,
        }
    }

    pub fn covering(mut self, period: BillingPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn because(mut self, reason: SettlementReason) -> Self {
        self.reason = reason;
        self
    }

    /// Builds the settlement input
    pub fn build(self) -> NewSettlement {
        NewSettlement {
            resident_id: self.resident_id,
            period: self.period,
            amount: self.amount,
            reason: self.reason,
            remarks: self.remarks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_builder_defaults() {
        let room = RoomBuilder::new().build();
        assert_eq!(room.capacity, 2);
        assert!(room.price.is_positive());
    }

    #[test]
    fn test_payment_builder_shapes() {
        let resident = ResidentBuilder::new().build();
        let rent = PaymentBuilder::rent_for(resident.resident_id).build();
        assert!(!rent.is_deposit);
        assert_eq!(rent.periods.len(), 1);

        let deposit = PaymentBuilder::deposit_for(resident.resident_id).build();
        assert!(deposit.is_deposit);
        assert!(deposit.periods.is_empty());
    }
}
