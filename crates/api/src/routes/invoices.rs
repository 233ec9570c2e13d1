//! Invoice management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use facture_core::invoice::{InvoiceStatus, LineItemInput};
use facture_db::entities::{invoice_items, invoices};
use facture_db::repositories::invoice::{
    CreateInvoiceInput, InvoiceDetail, InvoiceFilter, InvoicePdfPayload, InvoiceRepository,
    InvoiceWithItems, UpdateInvoiceInput,
};

use super::payments::PaymentResponse;

/// Creates the invoice routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/{id}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{id}/status", patch(update_status))
        .route("/invoices/{id}/pdf-data", get(get_pdf_data))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A single line item in a create or update request.
#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    /// What the line is for.
    pub description: String,
    /// Quantity (must be positive).
    pub quantity: Decimal,
    /// Price per unit (must not be negative).
    pub unit_price: Decimal,
}

impl From<LineItemRequest> for LineItemInput {
    fn from(req: LineItemRequest) -> Self {
        Self {
            description: req.description,
            quantity: req.quantity,
            unit_price: req.unit_price,
        }
    }
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Client the invoice bills.
    pub client_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Tax rate percentage, 0-100.
    pub tax_rate: Decimal,
    /// ISO 4217 currency code; defaults to USD.
    pub currency: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Line items (at least one).
    pub items: Vec<LineItemRequest>,
}

/// Request body for updating an invoice.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// New client.
    pub client_id: Option<Uuid>,
    /// New issue date.
    pub issue_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New tax rate percentage.
    pub tax_rate: Option<Decimal>,
    /// New currency code.
    pub currency: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// Clear the stored notes.
    #[serde(default)]
    pub clear_notes: bool,
    /// Replacement line items; omitting keeps the current items.
    pub items: Option<Vec<LineItemRequest>>,
}

/// Request body for a manual status change.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status.
    pub status: InvoiceStatus,
    /// Payment date to stamp when moving to PAID; defaults to today.
    pub payment_date: Option<NaiveDate>,
}

/// Query parameters for invoice listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    /// Only invoices in this status.
    pub status: Option<InvoiceStatus>,
    /// Only invoices for this client.
    pub client_id: Option<Uuid>,
    /// Only invoices issued on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Only invoices issued on or before this date.
    pub date_to: Option<NaiveDate>,
    /// Substring match on the invoice number.
    pub search: Option<String>,
}

/// Response for a line item.
#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Description.
    pub description: String,
    /// Quantity.
    pub quantity: String,
    /// Unit price.
    pub unit_price: String,
    /// Rounded line total.
    pub total: String,
}

impl From<invoice_items::Model> for LineItemResponse {
    fn from(item: invoice_items::Model) -> Self {
        Self {
            id: item.id,
            description: item.description,
            quantity: item.quantity.to_string(),
            unit_price: item.unit_price.to_string(),
            total: item.total.to_string(),
        }
    }
}

/// Response for an invoice.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    /// Invoice ID.
    pub id: Uuid,
    /// Client ID.
    pub client_id: Uuid,
    /// Allocated invoice number.
    pub invoice_number: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Rounded subtotal.
    pub subtotal: String,
    /// Tax rate percentage.
    pub tax_rate: String,
    /// Rounded tax amount.
    pub tax_amount: String,
    /// Rounded grand total.
    pub total: String,
    /// Currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: String,
    /// Date the invoice was fully paid, if it is PAID.
    pub payment_date: Option<NaiveDate>,
    /// Notes.
    pub notes: Option<String>,
    /// Line items.
    pub items: Vec<LineItemResponse>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl InvoiceResponse {
    fn new(invoice: invoices::Model, items: Vec<invoice_items::Model>) -> Self {
        let status: InvoiceStatus = invoice.status.into();
        Self {
            id: invoice.id,
            client_id: invoice.client_id,
            invoice_number: invoice.invoice_number,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            subtotal: invoice.subtotal.to_string(),
            tax_rate: invoice.tax_rate.to_string(),
            tax_amount: invoice.tax_amount.to_string(),
            total: invoice.total.to_string(),
            currency: invoice.currency,
            status: status.to_string(),
            payment_date: invoice.payment_date,
            notes: invoice.notes,
            items: items.into_iter().map(LineItemResponse::from).collect(),
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}

impl From<InvoiceWithItems> for InvoiceResponse {
    fn from(value: InvoiceWithItems) -> Self {
        Self::new(value.invoice, value.items)
    }
}

/// Response for an invoice with its payment history.
#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    /// The invoice.
    #[serde(flatten)]
    pub invoice: InvoiceResponse,
    /// Payments recorded against the invoice, newest first.
    pub payments: Vec<PaymentResponse>,
}

impl From<InvoiceDetail> for InvoiceDetailResponse {
    fn from(detail: InvoiceDetail) -> Self {
        Self {
            invoice: InvoiceResponse::new(detail.invoice, detail.items),
            payments: detail
                .payments
                .into_iter()
                .map(PaymentResponse::from)
                .collect(),
        }
    }
}

/// Response payload for client-side PDF rendering.
#[derive(Debug, Serialize)]
pub struct PdfDataResponse {
    /// Invoice number.
    pub invoice_number: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Billed client's name.
    pub client_name: String,
    /// Billed client's email.
    pub client_email: String,
    /// Billed client's address.
    pub client_address: Option<String>,
    /// Line items.
    pub items: Vec<PdfItemResponse>,
    /// Subtotal.
    pub subtotal: String,
    /// Tax rate percentage.
    pub tax_rate: String,
    /// Tax amount.
    pub tax_amount: String,
    /// Grand total.
    pub total: String,
    /// Currency code.
    pub currency: String,
    /// Notes.
    pub notes: Option<String>,
}

/// A line item in the PDF payload.
#[derive(Debug, Serialize)]
pub struct PdfItemResponse {
    /// Description.
    pub description: String,
    /// Quantity.
    pub quantity: String,
    /// Unit price.
    pub unit_price: String,
    /// Line total.
    pub total: String,
}

impl From<InvoicePdfPayload> for PdfDataResponse {
    fn from(payload: InvoicePdfPayload) -> Self {
        Self {
            invoice_number: payload.invoice_number,
            issue_date: payload.issue_date,
            due_date: payload.due_date,
            client_name: payload.client_name,
            client_email: payload.client_email,
            client_address: payload.client_address,
            items: payload
                .items
                .into_iter()
                .map(|item| PdfItemResponse {
                    description: item.description,
                    quantity: item.quantity.to_string(),
                    unit_price: item.unit_price.to_string(),
                    total: item.total.to_string(),
                })
                .collect(),
            subtotal: payload.subtotal.to_string(),
            tax_rate: payload.tax_rate.to_string(),
            tax_amount: payload.tax_amount.to_string(),
            total: payload.total.to_string(),
            currency: payload.currency,
            notes: payload.notes,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/invoices` - List the caller's invoices with optional filters.
async fn list_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());

    let filter = InvoiceFilter {
        status: query.status.map(Into::into),
        client_id: query.client_id,
        date_from: query.date_from,
        date_to: query.date_to,
        search: query.search,
    };

    let invoices = repo.list(auth.user_id(), filter).await?;
    let response: Vec<InvoiceResponse> = invoices.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(json!({ "invoices": response }))))
}

/// POST `/invoices` - Create an invoice in DRAFT.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());

    let input = CreateInvoiceInput {
        user_id: auth.user_id(),
        client_id: payload.client_id,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        tax_rate: payload.tax_rate,
        currency: payload.currency.unwrap_or_else(|| "USD".to_string()),
        notes: payload.notes,
        items: payload.items.into_iter().map(Into::into).collect(),
    };

    let created = repo.create(input, Utc::now().date_naive()).await?;

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(created))))
}

/// GET `/invoices/{id}` - Fetch one invoice with items and payments.
async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());

    let detail = repo.find_by_id(auth.user_id(), id).await?;

    Ok((StatusCode::OK, Json(InvoiceDetailResponse::from(detail))))
}

/// PATCH `/invoices/{id}` - Update an invoice; PAID and CANCELLED reject edits.
async fn update_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());

    let patch = UpdateInvoiceInput {
        client_id: payload.client_id,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        tax_rate: payload.tax_rate,
        currency: payload.currency,
        notes: payload.notes,
        clear_notes: payload.clear_notes,
        items: payload
            .items
            .map(|items| items.into_iter().map(Into::into).collect()),
    };

    let updated = repo.update(auth.user_id(), id, patch).await?;

    Ok((StatusCode::OK, Json(InvoiceResponse::from(updated))))
}

/// DELETE `/invoices/{id}` - Delete an invoice; PAID and CANCELLED reject deletion.
async fn delete_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());

    repo.delete(auth.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH `/invoices/{id}/status` - Manual status change.
///
/// Moving to PAID stamps the payment date (supplied or today); any
/// other target clears it. CANCELLED invoices reject all changes.
async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());

    let updated = repo
        .update_status(
            auth.user_id(),
            id,
            payload.status,
            payload.payment_date,
            Utc::now().date_naive(),
        )
        .await?;

    let items = repo.find_by_id(auth.user_id(), updated.id).await?.items;

    Ok((StatusCode::OK, Json(InvoiceResponse::new(updated, items))))
}

/// GET `/invoices/{id}/pdf-data` - Data needed to render the invoice as a PDF.
async fn get_pdf_data(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = InvoiceRepository::new((*state.db).clone());

    let payload = repo.pdf_payload(auth.user_id(), id).await?;

    Ok((StatusCode::OK, Json(PdfDataResponse::from(payload))))
}
