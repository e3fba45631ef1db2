//! Test Fixtures
//!
//! Pre-built test data for common entities, centralizing the magic values
//! used across the suite.

use core_kernel::{BillingPeriod, Currency, Money, ResidentId, RoomId};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal_macros::dec;

/// Money amounts used across tests
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard monthly rent for a double room
    pub fn rent() -> Money {
        Money::inr(dec!(8000))
    }

    /// Rent for the premium rooms in scenario tests
    pub fn premium_rent() -> Money {
        Money::inr(dec!(9500))
    }

    /// A typical partial payment
    pub fn partial_payment() -> Money {
        Money::inr(dec!(5000))
    }

    /// Standard security deposit
    pub fn deposit() -> Money {
        Money::inr(dec!(5000))
    }

    /// Zero in the operating currency
    pub fn zero() -> Money {
        Money::zero(Currency::INR)
    }
}

/// Billing periods used across tests
pub struct PeriodFixtures;

impl PeriodFixtures {
    pub fn march() -> BillingPeriod {
        "March 2025".parse().expect("valid period")
    }

    pub fn april() -> BillingPeriod {
        "April 2025".parse().expect("valid period")
    }

    pub fn may() -> BillingPeriod {
        "May 2025".parse().expect("valid period")
    }
}

/// Identifier fixtures
pub struct IdFixtures;

impl IdFixtures {
    pub fn room_id() -> RoomId {
        RoomId::new_v7()
    }

    pub fn resident_id() -> ResidentId {
        ResidentId::new_v7()
    }
}

/// Realistic people data
pub struct PersonFixtures;

impl PersonFixtures {
    /// A random realistic name
    pub fn name() -> String {
        Name().fake()
    }

    /// A random realistic email address
    pub fn email() -> String {
        SafeEmail().fake()
    }
}
