//! Custom Test Assertions
//!
//! Specialized assertion helpers for domain types that give more meaningful
//! error messages than standard assertions.

use core_kernel::Money;
use domain_billing::dues::DueStatement;
use domain_occupancy::Room;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than
/// the tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts the room occupancy invariant: `0 <= occupancy <= capacity`
pub fn assert_occupancy_invariant(room: &Room) {
    assert!(
        room.current_occupancy >= 0 && room.current_occupancy <= room.capacity,
        "Occupancy invariant violated for room {}: occupancy={}, capacity={}",
        room.label(),
        room.current_occupancy,
        room.capacity
    );
}

/// Asserts the internal consistency of a due statement
///
/// `effective_due` must equal `max(0, price - paid - settled)` and the
/// status flags must agree with the totals.
pub fn assert_due_statement_consistent(statement: &DueStatement) {
    let computed = (statement.room_price - statement.total_paid - statement.total_settled)
        .or_zero_if_negative();
    assert_eq!(
        statement.effective_due, computed,
        "effective_due is not max(0, price - paid - settled)"
    );
    assert!(
        !(statement.is_fully_paid && statement.is_partially_paid),
        "a due cannot be both fully and partially paid"
    );
    if statement.is_fully_paid {
        assert_money_zero(&statement.effective_due);
    }
}
