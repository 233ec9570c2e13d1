//! Payment validation and the balance invariant.
//!
//! The sum of all payments on an invoice must never exceed the invoice
//! total. Every payment mutation (record and update alike) re-checks
//! the invariant before anything is persisted.

use rust_decimal::Decimal;
use thiserror::Error;

use facture_shared::types::remaining_balance;

/// Errors raised by payment validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Payment amount must be positive.
    #[error("Payment amount must be greater than zero")]
    NonPositiveAmount,

    /// Payment would overpay the invoice.
    #[error("Payment amount exceeds remaining balance. Remaining: {remaining}")]
    BalanceExceeded {
        /// The exact remaining balance on the invoice.
        remaining: Decimal,
    },
}

/// Validates a payment amount.
///
/// # Errors
///
/// Returns `PaymentError::NonPositiveAmount` for zero or negative
/// amounts.
pub fn validate_amount(amount: Decimal) -> Result<(), PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::NonPositiveAmount);
    }
    Ok(())
}

/// Checks the balance invariant for a prospective payment.
///
/// `already_paid` is the sum of every other payment on the invoice;
/// for an update this excludes the payment being changed.
///
/// # Errors
///
/// Returns `PaymentError::BalanceExceeded` carrying the exact
/// remaining balance when `already_paid + amount > total`.
pub fn check_balance(
    total: Decimal,
    already_paid: Decimal,
    amount: Decimal,
) -> Result<(), PaymentError> {
    if already_paid + amount > total {
        return Err(PaymentError::BalanceExceeded {
            remaining: remaining_balance(total, already_paid),
        });
    }
    Ok(())
}
