//! User repository.
//!
//! Accounts are provisioned out of band; the API only needs to resolve
//! the authenticated user behind a token.

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::users;

/// User repository for account lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by id.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(user_id).one(&self.db).await
    }

    /// Finds a user by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(users::Column::Email))).eq(email.to_lowercase()))
            .one(&self.db)
            .await
    }
}
