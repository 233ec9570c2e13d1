//! Money rounding with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All monetary fields are stored and compared at 2-decimal precision
//! via `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal amount to exactly 2 fractional digits.
///
/// Uses round-half-away-from-zero, so `10.005` rounds to `10.01`
/// and `-10.005` rounds to `-10.01`.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the remaining balance on an invoice after payments.
///
/// Both inputs are expected at 2-decimal precision; the result is
/// rounded again so "fully paid" checks can use `remaining <= 0`.
#[must_use]
pub fn remaining_balance(total: Decimal, paid: Decimal) -> Decimal {
    round2(total - paid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(dec!(10.005)), dec!(10.01));
        assert_eq!(round2(dec!(20.01)), dec!(20.01));
        assert_eq!(round2(dec!(2.001)), dec!(2.00));
        assert_eq!(round2(dec!(2.005)), dec!(2.01));
    }

    #[test]
    fn test_round2_away_from_zero_for_negatives() {
        assert_eq!(round2(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round2(dec!(-2.004)), dec!(-2.00));
    }

    #[test]
    fn test_round2_is_stable_at_two_places() {
        assert_eq!(round2(dec!(100.00)), dec!(100.00));
        assert_eq!(round2(dec!(0)), dec!(0.00));
    }

    #[test]
    fn test_remaining_balance() {
        assert_eq!(remaining_balance(dec!(100.00), dec!(70.00)), dec!(30.00));
        assert_eq!(remaining_balance(dec!(100.00), dec!(100.00)), dec!(0.00));
    }

    #[test]
    fn test_fully_paid_uses_lte_zero() {
        let remaining = remaining_balance(dec!(100.00), dec!(100.00));
        assert!(remaining <= Decimal::ZERO);

        let remaining = remaining_balance(dec!(100.00), dec!(99.99));
        assert!(remaining > Decimal::ZERO);
    }
}
