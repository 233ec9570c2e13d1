//! Payment recording routes.
//!
//! Payments are created through their invoice; updates and deletes
//! address the payment directly.

use axum::{
    Json, Router,
    extract::{Path, State},
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
use facture_db::entities::{payments, sea_orm_active_enums::PaymentMethod};
use facture_db::repositories::payment::{
    PaymentRepository, RecordPaymentInput, UpdatePaymentInput,
};

/// Creates the payment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/invoices/{id}/payments",
            get(list_payments).post(record_payment),
        )
        .route("/payments/{id}", patch(update_payment).delete(delete_payment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for recording a payment.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// Payment amount (must be positive).
    pub amount: Decimal,
    /// Date the payment was made.
    pub payment_date: NaiveDate,
    /// How the payment was made.
    pub payment_method: PaymentMethod,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Request body for updating a payment.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePaymentRequest {
    /// New amount; re-checked against the invoice balance.
    pub amount: Option<Decimal>,
    /// New payment date.
    pub payment_date: Option<NaiveDate>,
    /// New payment method.
    pub payment_method: Option<PaymentMethod>,
    /// New notes.
    pub notes: Option<String>,
    /// Clear the stored notes.
    #[serde(default)]
    pub clear_notes: bool,
}

/// Response for a payment.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payment ID.
    pub id: Uuid,
    /// Invoice the payment applies to.
    pub invoice_id: Uuid,
    /// Amount paid.
    pub amount: String,
    /// Date of the payment.
    pub payment_date: NaiveDate,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Notes.
    pub notes: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<payments::Model> for PaymentResponse {
    fn from(payment: payments::Model) -> Self {
        Self {
            id: payment.id,
            invoice_id: payment.invoice_id,
            amount: payment.amount.to_string(),
            payment_date: payment.payment_date,
            payment_method: payment.payment_method,
            notes: payment.notes,
            created_at: payment.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/invoices/{id}/payments` - List an invoice's payments, newest first.
async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PaymentRepository::new((*state.db).clone());

    let payments = repo.list_for_invoice(auth.user_id(), invoice_id).await?;
    let response: Vec<PaymentResponse> = payments.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(json!({ "payments": response }))))
}

/// POST `/invoices/{id}/payments` - Record a payment.
///
/// Overpayment is rejected with the exact remaining balance; full
/// coverage marks the invoice PAID in the same transaction.
async fn record_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PaymentRepository::new((*state.db).clone());

    let input = RecordPaymentInput {
        amount: payload.amount,
        payment_date: payload.payment_date,
        payment_method: payload.payment_method,
        notes: payload.notes,
    };

    let recorded = repo.record(auth.user_id(), invoice_id, input).await?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(recorded))))
}

/// PATCH `/payments/{id}` - Update a payment.
async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PaymentRepository::new((*state.db).clone());

    let patch = UpdatePaymentInput {
        amount: payload.amount,
        payment_date: payload.payment_date,
        payment_method: payload.payment_method,
        notes: payload.notes,
        clear_notes: payload.clear_notes,
    };

    let updated = repo.update(auth.user_id(), id, patch).await?;

    Ok((StatusCode::OK, Json(PaymentResponse::from(updated))))
}

/// DELETE `/payments/{id}` - Delete a payment and re-derive the invoice status.
async fn delete_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PaymentRepository::new((*state.db).clone());

    repo.delete(auth.user_id(), id, Utc::now().date_naive())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
