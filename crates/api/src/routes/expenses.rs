//! Expense tracking routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use facture_db::entities::expenses;
use facture_db::repositories::expense::{
    CreateExpenseInput, ExpenseFilter, ExpenseRepository, UpdateExpenseInput,
};

/// Creates the expense routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/{id}",
            get(get_expense).patch(update_expense).delete(delete_expense),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an expense.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Category the expense belongs to.
    pub category_id: Uuid,
    /// What the money was spent on.
    pub description: String,
    /// Amount spent (must be positive).
    pub amount: Decimal,
    /// Date of the expense.
    pub expense_date: NaiveDate,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Stored receipt path.
    pub receipt_path: Option<String>,
}

/// Request body for updating an expense.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    /// New category.
    pub category_id: Option<Uuid>,
    /// New description.
    pub description: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New expense date.
    pub expense_date: Option<NaiveDate>,
    /// New notes.
    pub notes: Option<String>,
    /// Clear the stored notes.
    #[serde(default)]
    pub clear_notes: bool,
}

/// Query parameters for expense listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListExpensesQuery {
    /// Only expenses in this category.
    pub category_id: Option<Uuid>,
    /// Only expenses on or after this date.
    pub from: Option<NaiveDate>,
    /// Only expenses on or before this date.
    pub to: Option<NaiveDate>,
}

/// Response for an expense.
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Category ID.
    pub category_id: Uuid,
    /// Description.
    pub description: String,
    /// Amount spent.
    pub amount: String,
    /// Date of the expense.
    pub expense_date: NaiveDate,
    /// Notes.
    pub notes: Option<String>,
    /// Stored receipt path.
    pub receipt_path: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<expenses::Model> for ExpenseResponse {
    fn from(expense: expenses::Model) -> Self {
        Self {
            id: expense.id,
            category_id: expense.category_id,
            description: expense.description,
            amount: expense.amount.to_string(),
            expense_date: expense.expense_date,
            notes: expense.notes,
            receipt_path: expense.receipt_path,
            created_at: expense.created_at.to_rfc3339(),
            updated_at: expense.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/expenses` - List the caller's expenses with optional filters.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListExpensesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ExpenseRepository::new((*state.db).clone());

    let filter = ExpenseFilter {
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    };

    let expenses = repo.list(auth.user_id(), filter).await?;
    let response: Vec<ExpenseResponse> = expenses.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(json!({ "expenses": response }))))
}

/// POST `/expenses` - Create an expense.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ExpenseRepository::new((*state.db).clone());

    let input = CreateExpenseInput {
        category_id: payload.category_id,
        description: payload.description,
        amount: payload.amount,
        expense_date: payload.expense_date,
        notes: payload.notes,
        receipt_path: payload.receipt_path,
    };

    let created = repo.create(auth.user_id(), input).await?;

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(created))))
}

/// GET `/expenses/{id}` - Fetch one expense.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ExpenseRepository::new((*state.db).clone());

    let expense = repo.find_by_id(auth.user_id(), id).await?;

    Ok((StatusCode::OK, Json(ExpenseResponse::from(expense))))
}

/// PATCH `/expenses/{id}` - Update an expense.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ExpenseRepository::new((*state.db).clone());

    let patch = UpdateExpenseInput {
        category_id: payload.category_id,
        description: payload.description,
        amount: payload.amount,
        expense_date: payload.expense_date,
        notes: payload.notes,
        clear_notes: payload.clear_notes,
    };

    let updated = repo.update(auth.user_id(), id, patch).await?;

    Ok((StatusCode::OK, Json(ExpenseResponse::from(updated))))
}

/// DELETE `/expenses/{id}` - Delete an expense.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ExpenseRepository::new((*state.db).clone());

    repo.delete(auth.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
