//! Integration tests for the Money type

use core_kernel::{Currency, Money, MoneyError};
use rust_decimal_macros::dec;

#[test]
fn money_rounds_to_currency_precision() {
    let m = Money::inr(dec!(8000.006));
    assert_eq!(m.amount(), dec!(8000.01));
}

#[test]
fn money_display_uses_symbol() {
    let m = Money::inr(dec!(9500));
    assert_eq!(m.to_string(), "₹ 9500.00");
}

#[test]
fn checked_sub_preserves_currency() {
    let price = Money::inr(dec!(9500));
    let paid = Money::inr(dec!(5000));

    let due = price.checked_sub(&paid).unwrap();
    assert_eq!(due.amount(), dec!(4500));
    assert_eq!(due.currency(), Currency::INR);
}

#[test]
fn cross_currency_arithmetic_is_rejected() {
    let inr = Money::inr(dec!(100));
    let eur = Money::new(dec!(100), Currency::EUR);

    assert!(matches!(
        inr.checked_sub(&eur),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}

#[test]
fn zero_is_neither_positive_nor_negative() {
    let zero = Money::zero(Currency::INR);
    assert!(zero.is_zero());
    assert!(!zero.is_positive());
    assert!(!zero.is_negative());
}
