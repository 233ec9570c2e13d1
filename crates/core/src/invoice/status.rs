//! Invoice status state machine.
//!
//! Statuses: DRAFT -> SENT -> PAID/OVERDUE, with CANCELLED as a
//! terminal state reachable only through the manual override path.
//! The decision functions here are pure; the db layer applies their
//! outcome inside the same transaction as the payment mutation that
//! triggered them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use facture_shared::types::round2;

use super::error::InvoiceError;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Created but not yet sent to the client.
    Draft,
    /// Sent and awaiting payment.
    Sent,
    /// Fully paid.
    Paid,
    /// Sent and past its due date.
    Overdue,
    /// Terminal; rejects all further mutations.
    Cancelled,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::Sent => write!(f, "SENT"),
            Self::Paid => write!(f, "PAID"),
            Self::Overdue => write!(f, "OVERDUE"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "SENT" => Ok(Self::Sent),
            "PAID" => Ok(Self::Paid),
            "OVERDUE" => Ok(Self::Overdue),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown invoice status: {s}")),
        }
    }
}

/// What to do with the invoice's `payment_date` after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDateAction {
    /// Stamp the given date.
    Set(NaiveDate),
    /// Clear the stored date.
    Clear,
    /// Leave the stored date untouched.
    Keep,
}

/// Outcome of a state-machine decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// New status, or `None` when the status is unchanged.
    pub status: Option<InvoiceStatus>,
    /// Payment-date side effect.
    pub payment_date: PaymentDateAction,
}

impl StatusChange {
    const fn unchanged() -> Self {
        Self {
            status: None,
            payment_date: PaymentDateAction::Keep,
        }
    }
}

/// Validates that an invoice's line items or fields may be edited.
///
/// # Errors
///
/// Returns an error for PAID (immutable once settled) and CANCELLED
/// (terminal) invoices.
pub const fn can_modify(status: InvoiceStatus) -> Result<(), InvoiceError> {
    match status {
        InvoiceStatus::Paid => Err(InvoiceError::CannotModifyPaid),
        InvoiceStatus::Cancelled => Err(InvoiceError::InvoiceCancelled),
        _ => Ok(()),
    }
}

/// Validates that an invoice may be deleted.
///
/// # Errors
///
/// Returns an error for PAID and CANCELLED invoices.
pub const fn can_delete(status: InvoiceStatus) -> Result<(), InvoiceError> {
    match status {
        InvoiceStatus::Paid => Err(InvoiceError::CannotDeletePaid),
        InvoiceStatus::Cancelled => Err(InvoiceError::InvoiceCancelled),
        _ => Ok(()),
    }
}

/// Validates that an invoice may receive a payment.
///
/// # Errors
///
/// Returns an error for CANCELLED invoices; every other status accepts
/// payments (the balance invariant is checked separately).
pub const fn can_receive_payment(status: InvoiceStatus) -> Result<(), InvoiceError> {
    match status {
        InvoiceStatus::Cancelled => Err(InvoiceError::InvoiceCancelled),
        _ => Ok(()),
    }
}

/// Validates that an invoice's status may be set via the manual
/// override path.
///
/// # Errors
///
/// Returns an error when the invoice is CANCELLED; CANCELLED is
/// terminal and cannot be left.
pub const fn can_change_status(current: InvoiceStatus) -> Result<(), InvoiceError> {
    match current {
        InvoiceStatus::Cancelled => Err(InvoiceError::InvoiceCancelled),
        _ => Ok(()),
    }
}

/// Derives the status transition after a payment is recorded.
///
/// If the new total paid covers the invoice total the invoice becomes
/// PAID with `payment_date` stamped from this payment. A partial
/// payment against a DRAFT invoice implies it was effectively sent.
#[must_use]
pub fn after_payment_recorded(
    status: InvoiceStatus,
    total: Decimal,
    paid_before: Decimal,
    amount: Decimal,
    payment_date: NaiveDate,
) -> StatusChange {
    let new_paid = round2(paid_before + amount);

    if new_paid >= total {
        return StatusChange {
            status: Some(InvoiceStatus::Paid),
            payment_date: PaymentDateAction::Set(payment_date),
        };
    }

    if status == InvoiceStatus::Draft {
        return StatusChange {
            status: Some(InvoiceStatus::Sent),
            payment_date: PaymentDateAction::Keep,
        };
    }

    StatusChange::unchanged()
}

/// Derives the status transition after a payment is removed.
///
/// With no payments left the invoice reverts to SENT, or OVERDUE when
/// already past due. Dropping below the total while PAID reverts to
/// SENT. Either way the stamped `payment_date` is cleared.
#[must_use]
pub fn after_payment_deleted(
    status: InvoiceStatus,
    total: Decimal,
    remaining_paid: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
) -> StatusChange {
    if remaining_paid <= Decimal::ZERO {
        let reverted = if due_date < today {
            InvoiceStatus::Overdue
        } else {
            InvoiceStatus::Sent
        };
        return StatusChange {
            status: Some(reverted),
            payment_date: PaymentDateAction::Clear,
        };
    }

    if remaining_paid < total && status == InvoiceStatus::Paid {
        return StatusChange {
            status: Some(InvoiceStatus::Sent),
            payment_date: PaymentDateAction::Clear,
        };
    }

    StatusChange::unchanged()
}

/// Derives the `payment_date` side effect of a manual status update.
///
/// Setting PAID stamps the supplied date (or today when omitted);
/// every other target clears the date.
#[must_use]
pub fn manual_status_effect(
    target: InvoiceStatus,
    supplied_payment_date: Option<NaiveDate>,
    today: NaiveDate,
) -> PaymentDateAction {
    if target == InvoiceStatus::Paid {
        PaymentDateAction::Set(supplied_payment_date.unwrap_or(today))
    } else {
        PaymentDateAction::Clear
    }
}

/// Returns true when the overdue sweep should transition this invoice.
///
/// Only SENT invoices strictly past their due date qualify; the sweep
/// never touches DRAFT, PAID, OVERDUE, or CANCELLED rows, which makes
/// it idempotent.
#[must_use]
pub fn is_overdue_candidate(status: InvoiceStatus, due_date: NaiveDate, today: NaiveDate) -> bool {
    status == InvoiceStatus::Sent && due_date < today
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_partial_payment_on_draft_moves_to_sent() {
        let change = after_payment_recorded(
            InvoiceStatus::Draft,
            dec!(100.00),
            dec!(0.00),
            dec!(60.00),
            date(2026, 3, 1),
        );

        assert_eq!(change.status, Some(InvoiceStatus::Sent));
        assert_eq!(change.payment_date, PaymentDateAction::Keep);
    }

    #[test]
    fn test_full_payment_moves_to_paid_with_date() {
        let change = after_payment_recorded(
            InvoiceStatus::Sent,
            dec!(100.00),
            dec!(60.00),
            dec!(40.00),
            date(2026, 3, 15),
        );

        assert_eq!(change.status, Some(InvoiceStatus::Paid));
        assert_eq!(
            change.payment_date,
            PaymentDateAction::Set(date(2026, 3, 15))
        );
    }

    #[test]
    fn test_single_payment_covering_total_on_draft() {
        let change = after_payment_recorded(
            InvoiceStatus::Draft,
            dec!(100.00),
            dec!(0.00),
            dec!(100.00),
            date(2026, 3, 1),
        );

        assert_eq!(change.status, Some(InvoiceStatus::Paid));
    }

    #[test]
    fn test_partial_payment_on_sent_leaves_status() {
        let change = after_payment_recorded(
            InvoiceStatus::Sent,
            dec!(100.00),
            dec!(10.00),
            dec!(20.00),
            date(2026, 3, 1),
        );

        assert_eq!(change.status, None);
        assert_eq!(change.payment_date, PaymentDateAction::Keep);
    }

    #[test]
    fn test_overdue_invoice_fully_paid() {
        let change = after_payment_recorded(
            InvoiceStatus::Overdue,
            dec!(100.00),
            dec!(0.00),
            dec!(100.00),
            date(2026, 3, 20),
        );

        assert_eq!(change.status, Some(InvoiceStatus::Paid));
    }

    #[test]
    fn test_delete_last_payment_reverts_to_sent() {
        let change = after_payment_deleted(
            InvoiceStatus::Paid,
            dec!(100.00),
            dec!(0.00),
            date(2026, 4, 1),
            date(2026, 3, 1),
        );

        assert_eq!(change.status, Some(InvoiceStatus::Sent));
        assert_eq!(change.payment_date, PaymentDateAction::Clear);
    }

    #[test]
    fn test_delete_last_payment_past_due_reverts_to_overdue() {
        let change = after_payment_deleted(
            InvoiceStatus::Paid,
            dec!(100.00),
            dec!(0.00),
            date(2026, 2, 1),
            date(2026, 3, 1),
        );

        assert_eq!(change.status, Some(InvoiceStatus::Overdue));
        assert_eq!(change.payment_date, PaymentDateAction::Clear);
    }

    #[test]
    fn test_delete_payment_dropping_below_total_reverts_paid_to_sent() {
        let change = after_payment_deleted(
            InvoiceStatus::Paid,
            dec!(100.00),
            dec!(40.00),
            date(2026, 4, 1),
            date(2026, 3, 1),
        );

        assert_eq!(change.status, Some(InvoiceStatus::Sent));
        assert_eq!(change.payment_date, PaymentDateAction::Clear);
    }

    #[test]
    fn test_delete_payment_on_partially_paid_sent_keeps_status() {
        let change = after_payment_deleted(
            InvoiceStatus::Sent,
            dec!(100.00),
            dec!(40.00),
            date(2026, 4, 1),
            date(2026, 3, 1),
        );

        assert_eq!(change.status, None);
        assert_eq!(change.payment_date, PaymentDateAction::Keep);
    }

    #[test]
    fn test_record_then_delete_sequence() {
        // Invoice total 100: pay 60, pay 40, then delete the second payment.
        let today = date(2026, 3, 1);
        let due = date(2026, 4, 1);
        let total = dec!(100.00);

        let first = after_payment_recorded(InvoiceStatus::Draft, total, dec!(0), dec!(60), today);
        assert_eq!(first.status, Some(InvoiceStatus::Sent));

        let second = after_payment_recorded(InvoiceStatus::Sent, total, dec!(60), dec!(40), today);
        assert_eq!(second.status, Some(InvoiceStatus::Paid));

        let deleted = after_payment_deleted(InvoiceStatus::Paid, total, dec!(60), due, today);
        assert_eq!(deleted.status, Some(InvoiceStatus::Sent));
        assert_eq!(deleted.payment_date, PaymentDateAction::Clear);
    }

    #[test]
    fn test_can_modify_guards() {
        assert!(can_modify(InvoiceStatus::Draft).is_ok());
        assert!(can_modify(InvoiceStatus::Sent).is_ok());
        assert!(can_modify(InvoiceStatus::Overdue).is_ok());
        assert_eq!(
            can_modify(InvoiceStatus::Paid),
            Err(InvoiceError::CannotModifyPaid)
        );
        assert_eq!(
            can_modify(InvoiceStatus::Cancelled),
            Err(InvoiceError::InvoiceCancelled)
        );
    }

    #[test]
    fn test_can_delete_guards() {
        assert!(can_delete(InvoiceStatus::Draft).is_ok());
        assert_eq!(
            can_delete(InvoiceStatus::Paid),
            Err(InvoiceError::CannotDeletePaid)
        );
        assert_eq!(
            can_delete(InvoiceStatus::Cancelled),
            Err(InvoiceError::InvoiceCancelled)
        );
    }

    #[test]
    fn test_cancelled_rejects_payments_and_status_changes() {
        assert_eq!(
            can_receive_payment(InvoiceStatus::Cancelled),
            Err(InvoiceError::InvoiceCancelled)
        );
        assert_eq!(
            can_change_status(InvoiceStatus::Cancelled),
            Err(InvoiceError::InvoiceCancelled)
        );
        assert!(can_receive_payment(InvoiceStatus::Overdue).is_ok());
        assert!(can_change_status(InvoiceStatus::Paid).is_ok());
    }

    #[test]
    fn test_manual_status_effect_paid() {
        let today = date(2026, 3, 1);
        assert_eq!(
            manual_status_effect(InvoiceStatus::Paid, Some(date(2026, 2, 15)), today),
            PaymentDateAction::Set(date(2026, 2, 15))
        );
        assert_eq!(
            manual_status_effect(InvoiceStatus::Paid, None, today),
            PaymentDateAction::Set(today)
        );
    }

    #[test]
    fn test_manual_status_effect_non_paid_clears() {
        let today = date(2026, 3, 1);
        assert_eq!(
            manual_status_effect(InvoiceStatus::Sent, None, today),
            PaymentDateAction::Clear
        );
        assert_eq!(
            manual_status_effect(InvoiceStatus::Cancelled, Some(today), today),
            PaymentDateAction::Clear
        );
    }

    #[test]
    fn test_overdue_candidate() {
        let today = date(2026, 3, 1);
        assert!(is_overdue_candidate(
            InvoiceStatus::Sent,
            date(2026, 2, 28),
            today
        ));
        // Due today is not yet overdue.
        assert!(!is_overdue_candidate(InvoiceStatus::Sent, today, today));
        assert!(!is_overdue_candidate(
            InvoiceStatus::Draft,
            date(2026, 2, 1),
            today
        ));
        assert!(!is_overdue_candidate(
            InvoiceStatus::Paid,
            date(2026, 2, 1),
            today
        ));
        // Already OVERDUE rows are not candidates, which keeps the
        // sweep idempotent.
        assert!(!is_overdue_candidate(
            InvoiceStatus::Overdue,
            date(2026, 2, 1),
            today
        ));
        assert!(!is_overdue_candidate(
            InvoiceStatus::Cancelled,
            date(2026, 2, 1),
            today
        ));
    }

    #[test]
    fn test_status_display_roundtrip() {
        use std::str::FromStr;

        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            assert_eq!(
                InvoiceStatus::from_str(&status.to_string()).unwrap(),
                status
            );
        }
        assert!(InvoiceStatus::from_str("VOID").is_err());
    }
}
