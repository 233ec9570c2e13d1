//! Invoice repository for invoice database operations.
//!
//! Owns invoice creation (totals + number allocation + item insert in
//! one transaction), the item-replace update path, the manual status
//! override, and the bulk overdue sweep.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use tracing::{debug, warn};
use uuid::Uuid;

use facture_core::invoice::{
    InvoiceError as DomainError, InvoiceStatus as CoreStatus, LineItemInput, MAX_NUMBER_ATTEMPTS,
    PaymentDateAction, calculate_totals, fallback_number, format_number, next_sequence,
    prefix_for_year, status,
};
use facture_shared::AppError;

use crate::entities::{clients, invoice_items, invoices, payments, sea_orm_active_enums::InvoiceStatus};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found (or not owned by the caller).
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// Client not found (or not owned by the caller).
    #[error("Client not found: {0}")]
    ClientNotFound(Uuid),

    /// Domain rule violation (validation or lifecycle guard).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::NotFound(_) => Self::NotFound("Invoice not found".to_string()),
            InvoiceError::ClientNotFound(_) => Self::NotFound("Client not found".to_string()),
            InvoiceError::Domain(e) => match e {
                DomainError::CannotModifyPaid
                | DomainError::CannotDeletePaid
                | DomainError::InvoiceCancelled => Self::InvalidState(e.to_string()),
                _ => Self::Validation(e.to_string()),
            },
            InvoiceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Billed client (must belong to the owner).
    pub client_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date; drives overdue logic.
    pub due_date: NaiveDate,
    /// Tax rate percentage, 0-100.
    pub tax_rate: Decimal,
    /// ISO-like 3-letter currency code, stored verbatim.
    pub currency: String,
    /// Optional free-form notes.
    pub notes: Option<String>,
    /// Line items (at least one).
    pub items: Vec<LineItemInput>,
}

/// Field-level patch for updating an invoice.
///
/// `None` leaves a field unchanged. `clear_notes` distinguishes
/// clearing the notes from omitting them.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    /// New client.
    pub client_id: Option<Uuid>,
    /// New issue date.
    pub issue_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New tax rate.
    pub tax_rate: Option<Decimal>,
    /// New currency code.
    pub currency: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// Clear the stored notes.
    pub clear_notes: bool,
    /// Replacement line items; replaces the full set when present.
    pub items: Option<Vec<LineItemInput>>,
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Filter by status.
    pub status: Option<InvoiceStatus>,
    /// Filter by client.
    pub client_id: Option<Uuid>,
    /// Issue date range start (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Issue date range end (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive invoice number substring.
    pub search: Option<String>,
}

/// Invoice header with its line items.
#[derive(Debug, Clone)]
pub struct InvoiceWithItems {
    /// Invoice header.
    pub invoice: invoices::Model,
    /// Line items in position order.
    pub items: Vec<invoice_items::Model>,
}

/// Invoice header with items and payments.
#[derive(Debug, Clone)]
pub struct InvoiceDetail {
    /// Invoice header.
    pub invoice: invoices::Model,
    /// Line items in position order.
    pub items: Vec<invoice_items::Model>,
    /// Payments, newest payment date first.
    pub payments: Vec<payments::Model>,
}

/// Numeric payload handed to the external PDF renderer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvoicePdfPayload {
    /// Invoice number.
    pub invoice_number: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Client display name.
    pub client_name: String,
    /// Client email.
    pub client_email: String,
    /// Client address, when known.
    pub client_address: Option<String>,
    /// Line rows: description, quantity, unit price, total.
    pub items: Vec<PdfLineItem>,
    /// Subtotal.
    pub subtotal: Decimal,
    /// Tax rate percentage.
    pub tax_rate: Decimal,
    /// Tax amount.
    pub tax_amount: Decimal,
    /// Grand total.
    pub total: Decimal,
    /// Currency code.
    pub currency: String,
    /// Notes, when present.
    pub notes: Option<String>,
}

/// One row of the PDF payload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PdfLineItem {
    /// Description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Line total.
    pub total: Decimal,
}

/// Invoice repository for invoice CRUD and lifecycle operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice with its items in one transaction.
    ///
    /// Totals are computed by the core calculator; the invoice number
    /// is allocated for the owner and `today`'s year. The new invoice
    /// starts in DRAFT.
    ///
    /// # Errors
    ///
    /// Returns an error if the client does not belong to the owner,
    /// the items or tax rate fail validation, or a database operation
    /// fails.
    pub async fn create(
        &self,
        input: CreateInvoiceInput,
        today: NaiveDate,
    ) -> Result<InvoiceWithItems, InvoiceError> {
        // Verify the client belongs to the owner.
        clients::Entity::find_by_id(input.client_id)
            .filter(clients::Column::UserId.eq(input.user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::ClientNotFound(input.client_id))?;

        let totals = calculate_totals(&input.items, input.tax_rate)?;
        let invoice_number = self
            .allocate_invoice_number(input.user_id, today.year())
            .await?;

        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let invoice_id = Uuid::new_v4();

        let invoice = invoices::ActiveModel {
            id: Set(invoice_id),
            user_id: Set(input.user_id),
            client_id: Set(input.client_id),
            invoice_number: Set(invoice_number),
            issue_date: Set(input.issue_date),
            due_date: Set(input.due_date),
            subtotal: Set(totals.subtotal),
            tax_rate: Set(input.tax_rate),
            tax_amount: Set(totals.tax_amount),
            total: Set(totals.total),
            currency: Set(input.currency),
            status: Set(InvoiceStatus::Draft),
            payment_date: Set(None),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let items = Self::insert_items(&txn, invoice_id, &input.items, &totals.line_totals).await?;

        txn.commit().await?;

        debug!(invoice_id = %invoice.id, number = %invoice.invoice_number, "Invoice created");

        Ok(InvoiceWithItems { invoice, items })
    }

    /// Allocates the next invoice number for an owner and year.
    ///
    /// Starts from the owner's greatest existing number under the year
    /// prefix, then verifies global uniqueness; a collision with
    /// another owner's number bumps the sequence and tries again,
    /// bounded at `MAX_NUMBER_ATTEMPTS`. When retries exhaust it falls
    /// back to a timestamp-derived suffix. The unique index on
    /// `invoice_number` is the authoritative backstop for concurrent
    /// allocations.
    async fn allocate_invoice_number(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> Result<String, InvoiceError> {
        let prefix = prefix_for_year(year);

        let last = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::InvoiceNumber.starts_with(&prefix))
            .order_by_desc(invoices::Column::InvoiceNumber)
            .one(&self.db)
            .await?;

        let mut sequence = next_sequence(last.as_ref().map(|m| m.invoice_number.as_str()));

        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let candidate = format_number(year, sequence);

            // Numbers are unique across all owners, not just this one,
            // so another owner may already hold this sequence.
            let exists = invoices::Entity::find()
                .filter(invoices::Column::InvoiceNumber.eq(&candidate))
                .one(&self.db)
                .await?;

            if exists.is_none() {
                return Ok(candidate);
            }
            sequence += 1;
        }

        let fallback = fallback_number(year, Utc::now().timestamp_millis());
        warn!(%fallback, "Invoice number retries exhausted, using timestamp fallback");
        Ok(fallback)
    }

    /// Finds an invoice with items and payments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the invoice is missing or owned by
    /// another user.
    pub async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<InvoiceDetail, InvoiceError> {
        let invoice = self.find_owned(user_id, id).await?;
        let items = self.items_of(id).await?;
        let payments = payments::Entity::find()
            .filter(payments::Column::InvoiceId.eq(id))
            .order_by_desc(payments::Column::PaymentDate)
            .all(&self.db)
            .await?;

        Ok(InvoiceDetail {
            invoice,
            items,
            payments,
        })
    }

    /// Lists an owner's invoices with optional filters, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: InvoiceFilter,
    ) -> Result<Vec<InvoiceWithItems>, InvoiceError> {
        let mut query = invoices::Entity::find().filter(invoices::Column::UserId.eq(user_id));

        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(invoices::Column::ClientId.eq(client_id));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(invoices::Column::IssueDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(invoices::Column::IssueDate.lte(to));
        }
        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            query = query.filter(
                Expr::col((invoices::Entity, invoices::Column::InvoiceNumber))
                    .ilike(format!("%{search}%")),
            );
        }

        let headers = query
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(headers.len());
        for invoice in headers {
            let items = self.items_of(invoice.id).await?;
            result.push(InvoiceWithItems { invoice, items });
        }

        Ok(result)
    }

    /// Updates an invoice, replacing its items when a new set is given.
    ///
    /// Editing is rejected for PAID and CANCELLED invoices. When items
    /// are supplied the totals are recomputed (with the patched tax
    /// rate when present) and the full item set is replaced inside the
    /// same transaction as the header update.
    ///
    /// # Errors
    ///
    /// Returns an error on lifecycle guard violations, unknown client,
    /// validation failure, or database failure.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: UpdateInvoiceInput,
    ) -> Result<InvoiceWithItems, InvoiceError> {
        let existing = self.find_owned(user_id, id).await?;
        status::can_modify(existing.status.clone().into())?;

        if let Some(client_id) = patch.client_id
            && client_id != existing.client_id
        {
            clients::Entity::find_by_id(client_id)
                .filter(clients::Column::UserId.eq(user_id))
                .one(&self.db)
                .await?
                .ok_or(InvoiceError::ClientNotFound(client_id))?;
        }

        let tax_rate = patch.tax_rate.unwrap_or(existing.tax_rate);
        let totals = match &patch.items {
            Some(items) => Some(calculate_totals(items, tax_rate)?),
            None => {
                if let Some(rate) = patch.tax_rate {
                    // Tax rate changed without new items: recompute from
                    // the stored lines.
                    let stored = self.items_of(id).await?;
                    let inputs: Vec<LineItemInput> = stored
                        .iter()
                        .map(|i| LineItemInput {
                            description: i.description.clone(),
                            quantity: i.quantity,
                            unit_price: i.unit_price,
                        })
                        .collect();
                    Some(calculate_totals(&inputs, rate)?)
                } else {
                    None
                }
            }
        };

        let txn = self.db.begin().await?;

        let mut active: invoices::ActiveModel = existing.into();
        if let Some(client_id) = patch.client_id {
            active.client_id = Set(client_id);
        }
        if let Some(issue_date) = patch.issue_date {
            active.issue_date = Set(issue_date);
        }
        if let Some(due_date) = patch.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(rate) = patch.tax_rate {
            active.tax_rate = Set(rate);
        }
        if let Some(currency) = patch.currency {
            active.currency = Set(currency);
        }
        if patch.clear_notes {
            active.notes = Set(None);
        } else if let Some(notes) = patch.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(totals) = &totals {
            active.subtotal = Set(totals.subtotal);
            active.tax_amount = Set(totals.tax_amount);
            active.total = Set(totals.total);
        }
        active.updated_at = Set(Utc::now().into());

        let invoice = active.update(&txn).await?;

        if let (Some(items), Some(totals)) = (&patch.items, &totals) {
            // Full replace: delete-all, insert-new.
            invoice_items::Entity::delete_many()
                .filter(invoice_items::Column::InvoiceId.eq(id))
                .exec(&txn)
                .await?;
            Self::insert_items(&txn, id, items, &totals.line_totals).await?;
        }

        txn.commit().await?;

        let items = self.items_of(id).await?;
        Ok(InvoiceWithItems { invoice, items })
    }

    /// Deletes an invoice; items and payments cascade.
    ///
    /// # Errors
    ///
    /// Returns an error for PAID and CANCELLED invoices.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), InvoiceError> {
        let existing = self.find_owned(user_id, id).await?;
        status::can_delete(existing.status.clone().into())?;

        invoices::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Manual status override.
    ///
    /// Sets the status unconditionally (except out of CANCELLED, which
    /// is terminal). `payment_date` is stamped when the target is PAID
    /// (defaulting to `today`) and cleared otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error when the invoice is missing or CANCELLED.
    pub async fn update_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        target: CoreStatus,
        payment_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<invoices::Model, InvoiceError> {
        let existing = self.find_owned(user_id, id).await?;
        status::can_change_status(existing.status.clone().into())?;

        let effect = status::manual_status_effect(target, payment_date, today);

        let mut active: invoices::ActiveModel = existing.into();
        active.status = Set(target.into());
        match effect {
            PaymentDateAction::Set(date) => active.payment_date = Set(Some(date)),
            PaymentDateAction::Clear => active.payment_date = Set(None),
            PaymentDateAction::Keep => {}
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Overdue sweep: transitions SENT invoices past due to OVERDUE.
    ///
    /// Bulk, unconditional, idempotent; DRAFT, PAID, OVERDUE, and
    /// CANCELLED rows are never touched. Returns the number of
    /// invoices transitioned.
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, InvoiceError> {
        use sea_orm::ActiveEnum;

        let result = invoices::Entity::update_many()
            .col_expr(invoices::Column::Status, InvoiceStatus::Overdue.as_enum())
            .filter(invoices::Column::Status.eq(InvoiceStatus::Sent))
            .filter(invoices::Column::DueDate.lt(today))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Builds the numeric payload for the external PDF renderer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the invoice is missing or owned by
    /// another user.
    pub async fn pdf_payload(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<InvoicePdfPayload, InvoiceError> {
        let invoice = self.find_owned(user_id, id).await?;
        let client = clients::Entity::find_by_id(invoice.client_id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::ClientNotFound(invoice.client_id))?;
        let items = self.items_of(id).await?;

        Ok(InvoicePdfPayload {
            invoice_number: invoice.invoice_number,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            client_name: client.name,
            client_email: client.email,
            client_address: client.address,
            items: items
                .into_iter()
                .map(|i| PdfLineItem {
                    description: i.description,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    total: i.total,
                })
                .collect(),
            subtotal: invoice.subtotal,
            tax_rate: invoice.tax_rate,
            tax_amount: invoice.tax_amount,
            total: invoice.total,
            currency: invoice.currency,
            notes: invoice.notes,
        })
    }

    /// Loads an invoice scoped to its owner.
    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> Result<invoices::Model, InvoiceError> {
        invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))
    }

    /// Loads an invoice's items in position order.
    async fn items_of(&self, invoice_id: Uuid) -> Result<Vec<invoice_items::Model>, InvoiceError> {
        Ok(invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_items::Column::Position)
            .all(&self.db)
            .await?)
    }

    /// Inserts a replacement set of line items.
    async fn insert_items(
        txn: &DatabaseTransaction,
        invoice_id: Uuid,
        items: &[LineItemInput],
        line_totals: &[Decimal],
    ) -> Result<Vec<invoice_items::Model>, InvoiceError> {
        let mut models = Vec::with_capacity(items.len());
        for (position, (item, line_total)) in items.iter().zip(line_totals).enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let position = position as i32;
            models.push(invoice_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                description: Set(item.description.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                total: Set(*line_total),
                position: Set(position),
            });
        }

        let mut inserted = Vec::with_capacity(models.len());
        for model in models {
            inserted.push(model.insert(txn).await?);
        }
        Ok(inserted)
    }
}
