//! Expense category routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use facture_db::entities::expense_categories;
use facture_db::repositories::category::{
    CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            patch(update_category).delete(delete_category),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name, unique per account.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// Request body for updating a category.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Response for a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: Uuid,
    /// Category name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<expense_categories::Model> for CategoryResponse {
    fn from(category: expense_categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            created_at: category.created_at.to_rfc3339(),
            updated_at: category.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/categories` - List the caller's expense categories.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());

    let categories = repo.list(auth.user_id()).await?;
    let response: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(json!({ "categories": response }))))
}

/// POST `/categories` - Create an expense category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());

    let input = CreateCategoryInput {
        name: payload.name,
        description: payload.description,
    };

    let created = repo.create(auth.user_id(), input).await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}

/// PATCH `/categories/{id}` - Update a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());

    let patch = UpdateCategoryInput {
        name: payload.name,
        description: payload.description,
    };

    let updated = repo.update(auth.user_id(), id, patch).await?;

    Ok((StatusCode::OK, Json(CategoryResponse::from(updated))))
}

/// DELETE `/categories/{id}` - Delete a category; categories with expenses are kept.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());

    repo.delete(auth.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
