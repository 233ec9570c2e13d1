//! Payment repository for payment database operations.
//!
//! Every payment mutation checks the balance invariant (the sum of all
//! payments never exceeds the invoice total) and applies the resulting
//! invoice status transition inside the same transaction, so a reader
//! never observes a payment without its consistent invoice status.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use facture_core::invoice::{
    InvoiceError as DomainError, InvoiceStatus as CoreStatus, PaymentDateAction, StatusChange,
    status,
};
use facture_core::payment::{self, PaymentError as DomainPaymentError};
use facture_shared::AppError;
use facture_shared::types::round2;

use crate::entities::{invoices, payments, sea_orm_active_enums::PaymentMethod};

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Payment not found (or not owned by the caller).
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    /// Invoice not found (or not owned by the caller).
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// Lifecycle guard violation (e.g. cancelled invoice).
    #[error(transparent)]
    Invoice(#[from] DomainError),

    /// Payment validation failure (amount or balance invariant).
    #[error(transparent)]
    Validation(#[from] DomainPaymentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(_) => Self::NotFound("Payment not found".to_string()),
            PaymentError::InvoiceNotFound(_) => Self::NotFound("Invoice not found".to_string()),
            PaymentError::Invoice(e) => Self::InvalidState(e.to_string()),
            PaymentError::Validation(e) => match e {
                DomainPaymentError::NonPositiveAmount => Self::Validation(e.to_string()),
                DomainPaymentError::BalanceExceeded { remaining } => {
                    Self::BalanceExceeded { remaining }
                }
            },
            PaymentError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    /// Payment amount (must be positive).
    pub amount: Decimal,
    /// Date the payment was made.
    pub payment_date: NaiveDate,
    /// How the payment was made.
    pub payment_method: PaymentMethod,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Field-level patch for updating a payment.
///
/// `None` leaves a field unchanged; `clear_notes` distinguishes
/// clearing the notes from omitting them.
#[derive(Debug, Clone, Default)]
pub struct UpdatePaymentInput {
    /// New amount; re-validated against the balance invariant.
    pub amount: Option<Decimal>,
    /// New payment date.
    pub payment_date: Option<NaiveDate>,
    /// New payment method.
    pub payment_method: Option<PaymentMethod>,
    /// New notes.
    pub notes: Option<String>,
    /// Clear the stored notes.
    pub clear_notes: bool,
}

/// Payment repository for the payment ledger.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists an invoice's payments, newest payment date first.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` when the invoice is missing or owned
    /// by another user.
    pub async fn list_for_invoice(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Vec<payments::Model>, PaymentError> {
        self.find_owned_invoice(user_id, invoice_id).await?;

        Ok(payments::Entity::find()
            .filter(payments::Column::InvoiceId.eq(invoice_id))
            .order_by_desc(payments::Column::PaymentDate)
            .all(&self.db)
            .await?)
    }

    /// Records a payment against an invoice.
    ///
    /// Validates the amount and the balance invariant, then persists
    /// the payment together with the derived status transition: full
    /// coverage moves the invoice to PAID (stamping `payment_date`),
    /// a partial payment on a DRAFT invoice moves it to SENT.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive amounts, overpayment (with
    /// the exact remaining balance), cancelled invoices, or database
    /// failure.
    pub async fn record(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
        input: RecordPaymentInput,
    ) -> Result<payments::Model, PaymentError> {
        payment::validate_amount(input.amount)?;

        let invoice = self.find_owned_invoice(user_id, invoice_id).await?;
        let current: CoreStatus = invoice.status.clone().into();
        status::can_receive_payment(current)?;

        let paid_before = self.total_paid(invoice_id, None).await?;
        payment::check_balance(invoice.total, paid_before, input.amount)?;

        let change = status::after_payment_recorded(
            current,
            invoice.total,
            paid_before,
            input.amount,
            input.payment_date,
        );

        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let record = payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            amount: Set(input.amount),
            payment_date: Set(input.payment_date),
            payment_method: Set(input.payment_method),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        Self::apply_status_change(&txn, invoice, change).await?;

        txn.commit().await?;

        debug!(payment_id = %record.id, invoice_id = %invoice_id, "Payment recorded");

        Ok(record)
    }

    /// Updates a payment.
    ///
    /// An amount change re-validates the balance invariant against the
    /// other payments on the invoice and re-derives the invoice status
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error on validation failure, overpayment, or
    /// database failure.
    pub async fn update(
        &self,
        user_id: Uuid,
        payment_id: Uuid,
        patch: UpdatePaymentInput,
    ) -> Result<payments::Model, PaymentError> {
        let (existing, invoice) = self.find_owned_payment(user_id, payment_id).await?;

        let new_amount = patch.amount.unwrap_or(existing.amount);
        if let Some(amount) = patch.amount {
            payment::validate_amount(amount)?;
            let others_paid = self.total_paid(invoice.id, Some(payment_id)).await?;
            payment::check_balance(invoice.total, others_paid, amount)?;
        }

        let new_payment_date = patch.payment_date.unwrap_or(existing.payment_date);

        let txn = self.db.begin().await?;

        let mut active: payments::ActiveModel = existing.into();
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = patch.payment_date {
            active.payment_date = Set(date);
        }
        if let Some(method) = patch.payment_method {
            active.payment_method = Set(method);
        }
        if patch.clear_notes {
            active.notes = Set(None);
        } else if let Some(notes) = patch.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now().into());

        let record = active.update(&txn).await?;

        if patch.amount.is_some() {
            // Re-derive the invoice status from the new paid total.
            let others_paid = Self::total_paid_in(&txn, invoice.id, Some(payment_id)).await?;
            let new_total_paid = round2(others_paid + new_amount);
            let current: CoreStatus = invoice.status.clone().into();

            let change = if new_total_paid >= invoice.total {
                StatusChange {
                    status: Some(CoreStatus::Paid),
                    payment_date: PaymentDateAction::Set(new_payment_date),
                }
            } else {
                status::after_payment_deleted(
                    current,
                    invoice.total,
                    new_total_paid,
                    invoice.due_date,
                    Utc::now().date_naive(),
                )
            };

            Self::apply_status_change(&txn, invoice, change).await?;
        }

        txn.commit().await?;

        Ok(record)
    }

    /// Deletes a payment and re-derives the invoice status.
    ///
    /// With no payments left the invoice reverts to SENT (or OVERDUE
    /// when past due, judged against `today`); dropping below the
    /// total while PAID reverts to SENT. The stamped `payment_date`
    /// is cleared on any reversion.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the payment is missing or owned by
    /// another user.
    pub async fn delete(
        &self,
        user_id: Uuid,
        payment_id: Uuid,
        today: NaiveDate,
    ) -> Result<(), PaymentError> {
        let (existing, invoice) = self.find_owned_payment(user_id, payment_id).await?;

        let txn = self.db.begin().await?;

        payments::Entity::delete_by_id(existing.id).exec(&txn).await?;

        let remaining_paid = Self::total_paid_in(&txn, invoice.id, None).await?;
        let change = status::after_payment_deleted(
            invoice.status.clone().into(),
            invoice.total,
            remaining_paid,
            invoice.due_date,
            today,
        );

        Self::apply_status_change(&txn, invoice, change).await?;

        txn.commit().await?;

        debug!(payment_id = %payment_id, "Payment deleted");

        Ok(())
    }

    /// Applies a state-machine outcome to the invoice row.
    async fn apply_status_change(
        txn: &DatabaseTransaction,
        invoice: invoices::Model,
        change: StatusChange,
    ) -> Result<(), PaymentError> {
        if change.status.is_none() && change.payment_date == PaymentDateAction::Keep {
            return Ok(());
        }

        let mut active: invoices::ActiveModel = invoice.into();
        if let Some(new_status) = change.status {
            active.status = Set(new_status.into());
        }
        match change.payment_date {
            PaymentDateAction::Set(date) => active.payment_date = Set(Some(date)),
            PaymentDateAction::Clear => active.payment_date = Set(None),
            PaymentDateAction::Keep => {}
        }
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;

        Ok(())
    }

    /// Sums an invoice's payments, optionally excluding one payment.
    async fn total_paid(
        &self,
        invoice_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Decimal, PaymentError> {
        let mut query = payments::Entity::find().filter(payments::Column::InvoiceId.eq(invoice_id));
        if let Some(excluded) = exclude {
            query = query.filter(payments::Column::Id.ne(excluded));
        }
        let rows = query.all(&self.db).await?;
        Ok(round2(rows.iter().map(|p| p.amount).sum()))
    }

    /// Sums an invoice's payments inside a transaction.
    async fn total_paid_in(
        txn: &DatabaseTransaction,
        invoice_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Decimal, PaymentError> {
        let mut query = payments::Entity::find().filter(payments::Column::InvoiceId.eq(invoice_id));
        if let Some(excluded) = exclude {
            query = query.filter(payments::Column::Id.ne(excluded));
        }
        let rows = query.all(txn).await?;
        Ok(round2(rows.iter().map(|p| p.amount).sum()))
    }

    /// Loads an invoice scoped to its owner.
    async fn find_owned_invoice(
        &self,
        user_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<invoices::Model, PaymentError> {
        invoices::Entity::find_by_id(invoice_id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(PaymentError::InvoiceNotFound(invoice_id))
    }

    /// Loads a payment and its invoice, verifying ownership through
    /// the invoice.
    async fn find_owned_payment(
        &self,
        user_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(payments::Model, invoices::Model), PaymentError> {
        let payment = payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;

        let invoice = invoices::Entity::find_by_id(payment.invoice_id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;

        Ok((payment, invoice))
    }
}
