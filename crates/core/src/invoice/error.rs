//! Error types for invoice domain logic.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by invoice validation and lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    /// An invoice must have at least one line item.
    #[error("Invoice must have at least one line item")]
    NoItems,

    /// Line item quantity must be positive.
    #[error("Line item {index} has non-positive quantity")]
    NonPositiveQuantity {
        /// Zero-based index of the offending item.
        index: usize,
    },

    /// Line item unit price must not be negative.
    #[error("Line item {index} has negative unit price")]
    NegativeUnitPrice {
        /// Zero-based index of the offending item.
        index: usize,
    },

    /// Tax rate must be between 0 and 100 inclusive.
    #[error("Tax rate {0} is outside the valid range 0-100")]
    InvalidTaxRate(Decimal),

    /// Paid invoices cannot be edited.
    #[error("Cannot edit paid invoices")]
    CannotModifyPaid,

    /// Paid invoices cannot be deleted.
    #[error("Cannot delete paid invoices")]
    CannotDeletePaid,

    /// Cancelled invoices are terminal and reject all mutations.
    #[error("Invoice is cancelled")]
    InvoiceCancelled,
}
