//! Client repository for client database operations.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use facture_shared::AppError;

use crate::entities::{clients, invoices};

/// Error types for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Client not found (or not owned by the caller).
    #[error("Client not found: {0}")]
    NotFound(Uuid),

    /// Another client with the same email already exists for this user.
    #[error("A client with email '{0}' already exists")]
    DuplicateEmail(String),

    /// The client still has invoices and cannot be deleted.
    #[error("Cannot delete a client with existing invoices")]
    HasInvoices,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(_) => Self::NotFound("Client not found".to_string()),
            ClientError::DuplicateEmail(_) | ClientError::HasInvoices => {
                Self::Conflict(err.to_string())
            }
            ClientError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a client.
#[derive(Debug, Clone)]
pub struct CreateClientInput {
    /// Display name.
    pub name: String,
    /// Contact email, unique per owner case-insensitively.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional postal address.
    pub address: Option<String>,
    /// Optional company name.
    pub company: Option<String>,
}

/// Field-level patch for updating a client.
#[derive(Debug, Clone, Default)]
pub struct UpdateClientInput {
    /// New display name.
    pub name: Option<String>,
    /// New contact email; re-checked for uniqueness.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New postal address.
    pub address: Option<String>,
    /// New company name.
    pub company: Option<String>,
}

/// Client repository for the client roster.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a client for a user.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` when the user already has a client
    /// with the same email, compared case-insensitively.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateClientInput,
    ) -> Result<clients::Model, ClientError> {
        self.check_email_free(user_id, &input.email, None).await?;

        let now = Utc::now().into();
        let client = clients::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            company: Set(input.company),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        debug!(client_id = %client.id, "Client created");

        Ok(client)
    }

    /// Finds a client by id, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when missing or owned by another user.
    pub async fn find_by_id(
        &self,
        user_id: Uuid,
        client_id: Uuid,
    ) -> Result<clients::Model, ClientError> {
        clients::Entity::find_by_id(client_id)
            .filter(clients::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(ClientError::NotFound(client_id))
    }

    /// Lists a user's clients, alphabetically by name.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<clients::Model>, ClientError> {
        Ok(clients::Entity::find()
            .filter(clients::Column::UserId.eq(user_id))
            .order_by_asc(clients::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Updates a client.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` when an email change collides with
    /// another client of the same user.
    pub async fn update(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        patch: UpdateClientInput,
    ) -> Result<clients::Model, ClientError> {
        let existing = self.find_by_id(user_id, client_id).await?;

        if let Some(email) = &patch.email
            && !email.eq_ignore_ascii_case(&existing.email)
        {
            self.check_email_free(user_id, email, Some(client_id)).await?;
        }

        let mut active: clients::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = patch.address {
            active.address = Set(Some(address));
        }
        if let Some(company) = patch.company {
            active.company = Set(Some(company));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a client.
    ///
    /// # Errors
    ///
    /// Returns `HasInvoices` when any invoice references the client;
    /// the database RESTRICT constraint backs the same rule.
    pub async fn delete(&self, user_id: Uuid, client_id: Uuid) -> Result<(), ClientError> {
        let existing = self.find_by_id(user_id, client_id).await?;

        let invoice_count = invoices::Entity::find()
            .filter(invoices::Column::ClientId.eq(client_id))
            .count(&self.db)
            .await?;
        if invoice_count > 0 {
            return Err(ClientError::HasInvoices);
        }

        clients::Entity::delete_by_id(existing.id).exec(&self.db).await?;

        debug!(client_id = %client_id, "Client deleted");

        Ok(())
    }

    /// Fails with `DuplicateEmail` if another client of this user
    /// already uses the email, case-insensitively.
    async fn check_email_free(
        &self,
        user_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ClientError> {
        let mut query = clients::Entity::find()
            .filter(clients::Column::UserId.eq(user_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(clients::Column::Email)))
                    .eq(email.to_lowercase()),
            );
        if let Some(excluded) = exclude {
            query = query.filter(clients::Column::Id.ne(excluded));
        }

        if query.count(&self.db).await? > 0 {
            return Err(ClientError::DuplicateEmail(email.to_string()));
        }
        Ok(())
    }
}
