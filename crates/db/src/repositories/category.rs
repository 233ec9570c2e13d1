//! Expense category repository.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use facture_shared::AppError;

use crate::entities::{expense_categories, expenses};

/// Error types for expense category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found (or not owned by the caller).
    #[error("Expense category not found: {0}")]
    NotFound(Uuid),

    /// Another category with the same name already exists for this user.
    #[error("A category named '{0}' already exists")]
    DuplicateName(String),

    /// The category still has expenses and cannot be deleted.
    #[error("Cannot delete a category with existing expenses")]
    HasExpenses,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => Self::NotFound("Expense category not found".to_string()),
            CategoryError::DuplicateName(_) | CategoryError::HasExpenses => {
                Self::Conflict(err.to_string())
            }
            CategoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an expense category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Category name, unique per owner case-insensitively.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Field-level patch for updating an expense category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name; re-checked for uniqueness.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Repository for expense categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a category for a user.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` when the user already has a category
    /// with the same name, compared case-insensitively.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateCategoryInput,
    ) -> Result<expense_categories::Model, CategoryError> {
        self.check_name_free(user_id, &input.name, None).await?;

        let now = Utc::now().into();
        let category = expense_categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        debug!(category_id = %category.id, "Expense category created");

        Ok(category)
    }

    /// Finds a category by id, scoped to its owner.
    pub async fn find_by_id(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<expense_categories::Model, CategoryError> {
        expense_categories::Entity::find_by_id(category_id)
            .filter(expense_categories::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(category_id))
    }

    /// Lists a user's categories, alphabetically by name.
    pub async fn list(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<expense_categories::Model>, CategoryError> {
        Ok(expense_categories::Entity::find()
            .filter(expense_categories::Column::UserId.eq(user_id))
            .order_by_asc(expense_categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Updates a category.
    pub async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        patch: UpdateCategoryInput,
    ) -> Result<expense_categories::Model, CategoryError> {
        let existing = self.find_by_id(user_id, category_id).await?;

        if let Some(name) = &patch.name
            && !name.eq_ignore_ascii_case(&existing.name)
        {
            self.check_name_free(user_id, name, Some(category_id)).await?;
        }

        let mut active: expense_categories::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a category.
    ///
    /// # Errors
    ///
    /// Returns `HasExpenses` when any expense references the category;
    /// the database RESTRICT constraint backs the same rule.
    pub async fn delete(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CategoryError> {
        let existing = self.find_by_id(user_id, category_id).await?;

        let expense_count = expenses::Entity::find()
            .filter(expenses::Column::CategoryId.eq(category_id))
            .count(&self.db)
            .await?;
        if expense_count > 0 {
            return Err(CategoryError::HasExpenses);
        }

        expense_categories::Entity::delete_by_id(existing.id)
            .exec(&self.db)
            .await?;

        debug!(category_id = %category_id, "Expense category deleted");

        Ok(())
    }

    async fn check_name_free(
        &self,
        user_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), CategoryError> {
        let mut query = expense_categories::Entity::find()
            .filter(expense_categories::Column::UserId.eq(user_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(expense_categories::Column::Name)))
                    .eq(name.to_lowercase()),
            );
        if let Some(excluded) = exclude {
            query = query.filter(expense_categories::Column::Id.ne(excluded));
        }

        if query.count(&self.db).await? > 0 {
            return Err(CategoryError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}
