//! Invoice domain logic.
//!
//! Totals calculation, invoice numbering, and the status state machine.

pub mod error;
pub mod number;
pub mod status;
pub mod totals;

pub use error::InvoiceError;
pub use number::{MAX_NUMBER_ATTEMPTS, fallback_number, format_number, next_sequence, parse_sequence, prefix_for_year};
pub use status::{InvoiceStatus, PaymentDateAction, StatusChange};
pub use totals::{InvoiceTotals, LineItemInput, calculate_totals};
