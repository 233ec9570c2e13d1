//! Client management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use facture_db::entities::clients;
use facture_db::repositories::client::{ClientRepository, CreateClientInput, UpdateClientInput};

/// Creates the client routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).patch(update_client).delete(delete_client),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a client.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    /// Display name.
    pub name: String,
    /// Contact email, unique per account.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Company name.
    pub company: Option<String>,
}

/// Request body for updating a client.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientRequest {
    /// New display name.
    pub name: Option<String>,
    /// New contact email.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New postal address.
    pub address: Option<String>,
    /// New company name.
    pub company: Option<String>,
}

/// Response for a client.
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    /// Client ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<clients::Model> for ClientResponse {
    fn from(client: clients::Model) -> Self {
        Self {
            id: client.id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            address: client.address,
            company: client.company,
            created_at: client.created_at.to_rfc3339(),
            updated_at: client.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/clients` - List the caller's clients.
async fn list_clients(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ClientRepository::new((*state.db).clone());

    let clients = repo.list(auth.user_id()).await?;
    let response: Vec<ClientResponse> = clients.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(json!({ "clients": response }))))
}

/// POST `/clients` - Create a client.
async fn create_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ClientRepository::new((*state.db).clone());

    let input = CreateClientInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        company: payload.company,
    };

    let created = repo.create(auth.user_id(), input).await?;

    Ok((StatusCode::CREATED, Json(ClientResponse::from(created))))
}

/// GET `/clients/{id}` - Fetch one client.
async fn get_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ClientRepository::new((*state.db).clone());

    let client = repo.find_by_id(auth.user_id(), id).await?;

    Ok((StatusCode::OK, Json(ClientResponse::from(client))))
}

/// PATCH `/clients/{id}` - Update a client.
async fn update_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ClientRepository::new((*state.db).clone());

    let patch = UpdateClientInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        company: payload.company,
    };

    let updated = repo.update(auth.user_id(), id, patch).await?;

    Ok((StatusCode::OK, Json(ClientResponse::from(updated))))
}

/// DELETE `/clients/{id}` - Delete a client; clients with invoices are kept.
async fn delete_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ClientRepository::new((*state.db).clone());

    repo.delete(auth.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
