//! Postgres enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice lifecycle status, mirrored from `facture_core`.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Created but not yet sent.
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    /// Sent and awaiting payment.
    #[sea_orm(string_value = "SENT")]
    Sent,
    /// Fully paid.
    #[sea_orm(string_value = "PAID")]
    Paid,
    /// Sent and past its due date.
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
    /// Terminal state.
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl From<facture_core::invoice::InvoiceStatus> for InvoiceStatus {
    fn from(status: facture_core::invoice::InvoiceStatus) -> Self {
        use facture_core::invoice::InvoiceStatus as Core;
        match status {
            Core::Draft => Self::Draft,
            Core::Sent => Self::Sent,
            Core::Paid => Self::Paid,
            Core::Overdue => Self::Overdue,
            Core::Cancelled => Self::Cancelled,
        }
    }
}

impl From<InvoiceStatus> for facture_core::invoice::InvoiceStatus {
    fn from(status: InvoiceStatus) -> Self {
        use facture_core::invoice::InvoiceStatus as Core;
        match status {
            InvoiceStatus::Draft => Core::Draft,
            InvoiceStatus::Sent => Core::Sent,
            InvoiceStatus::Paid => Core::Paid,
            InvoiceStatus::Overdue => Core::Overdue,
            InvoiceStatus::Cancelled => Core::Cancelled,
        }
    }
}

/// Payment method recorded with each payment.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Paper check.
    #[sea_orm(string_value = "check")]
    Check,
    /// Credit card.
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    /// Debit card.
    #[sea_orm(string_value = "debit_card")]
    DebitCard,
    /// Bank transfer.
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    /// PayPal.
    #[sea_orm(string_value = "paypal")]
    Paypal,
    /// Anything else.
    #[sea_orm(string_value = "other")]
    Other,
}
