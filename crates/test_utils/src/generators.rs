//! Property-Based Test Generators
//!
//! Proptest strategies for generating random test data that maintains
//! domain invariants.

use core_kernel::{BillingPeriod, Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating positive rupee amounts (two decimal places)
pub fn positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Strategy for generating positive INR Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_strategy().prop_map(Money::inr)
}

/// Strategy for generating INR Money values including zero
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (0i64..10_000_000i64).prop_map(|minor| Money::new(Decimal::new(minor, 2), Currency::INR))
}

/// Strategy for generating valid billing period labels
pub fn period_strategy() -> impl Strategy<Value = BillingPeriod> {
    let months = proptest::sample::select(vec![
        "January", "February", "March", "April", "May", "June",
        "July", "August", "September", "October", "November", "December",
    ]);
    (months, 2020u32..2100u32).prop_map(|(month, year)| {
        format!("{} {}", month, year)
            .parse()
            .expect("generated label is valid")
    })
}

/// Strategy for generating a capacity with a consistent occupancy
pub fn capacity_occupancy_strategy() -> impl Strategy<Value = (i16, i16)> {
    (1i16..=8).prop_flat_map(|capacity| (Just(capacity), 0i16..=capacity))
}

/// Strategy for generating sets of occupied bed ordinals within a capacity
pub fn occupied_beds_strategy() -> impl Strategy<Value = (i16, Vec<i16>)> {
    (1i16..=8).prop_flat_map(|capacity| {
        let beds = proptest::sample::subsequence(
            (1..=capacity).collect::<Vec<i16>>(),
            0..=(capacity as usize),
        );
        (Just(capacity), beds)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_periods_are_valid(period in period_strategy()) {
            prop_assert!(!period.as_str().is_empty());
            prop_assert_eq!(period.as_str().parse::<BillingPeriod>().unwrap(), period);
        }

        #[test]
        fn generated_occupancy_respects_capacity(
            (capacity, occupancy) in capacity_occupancy_strategy()
        ) {
            prop_assert!(occupancy >= 0 && occupancy <= capacity);
        }

        #[test]
        fn generated_beds_are_in_range((capacity, beds) in occupied_beds_strategy()) {
            for bed in beds {
                prop_assert!((1..=capacity).contains(&bed));
            }
        }
    }
}
