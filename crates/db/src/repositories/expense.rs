//! Expense repository for expense database operations.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use facture_shared::AppError;

use crate::entities::{expense_categories, expenses};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found (or not owned by the caller).
    #[error("Expense not found: {0}")]
    NotFound(Uuid),

    /// Referenced category missing or owned by another user.
    #[error("Expense category not found: {0}")]
    CategoryNotFound(Uuid),

    /// The amount must be positive.
    #[error("Expense amount must be positive")]
    NonPositiveAmount,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ExpenseError> for AppError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::NotFound(_) => Self::NotFound("Expense not found".to_string()),
            ExpenseError::CategoryNotFound(_) => {
                Self::NotFound("Expense category not found".to_string())
            }
            ExpenseError::NonPositiveAmount => Self::Validation(err.to_string()),
            ExpenseError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Category the expense belongs to; must be owned by the caller.
    pub category_id: Uuid,
    /// What the money was spent on.
    pub description: String,
    /// Amount spent (must be positive).
    pub amount: Decimal,
    /// Date of the expense.
    pub expense_date: NaiveDate,
    /// Optional free-form notes.
    pub notes: Option<String>,
    /// Optional stored receipt path.
    pub receipt_path: Option<String>,
}

/// Field-level patch for updating an expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// New category; re-checked for ownership.
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
    pub clear_notes: bool,
}

/// Date-range and category filter for expense listings.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only expenses in this category.
    pub category_id: Option<Uuid>,
    /// Only expenses on or after this date.
    pub from: Option<NaiveDate>,
    /// Only expenses on or before this date.
    pub to: Option<NaiveDate>,
}

/// Expense repository for spend tracking.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense for a user.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` when the category is missing or
    /// owned by another user, `NonPositiveAmount` for a zero or
    /// negative amount.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateExpenseInput,
    ) -> Result<expenses::Model, ExpenseError> {
        if input.amount <= Decimal::ZERO {
            return Err(ExpenseError::NonPositiveAmount);
        }
        self.check_category(user_id, input.category_id).await?;

        let now = Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            category_id: Set(input.category_id),
            description: Set(input.description),
            amount: Set(input.amount),
            expense_date: Set(input.expense_date),
            notes: Set(input.notes),
            receipt_path: Set(input.receipt_path),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        debug!(expense_id = %expense.id, "Expense created");

        Ok(expense)
    }

    /// Finds an expense by id, scoped to its owner.
    pub async fn find_by_id(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> Result<expenses::Model, ExpenseError> {
        expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))
    }

    /// Lists a user's expenses, newest expense date first.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: ExpenseFilter,
    ) -> Result<Vec<expenses::Model>, ExpenseError> {
        let mut query = expenses::Entity::find().filter(expenses::Column::UserId.eq(user_id));

        if let Some(category_id) = filter.category_id {
            query = query.filter(expenses::Column::CategoryId.eq(category_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(expenses::Column::ExpenseDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expenses::Column::ExpenseDate.lte(to));
        }

        Ok(query
            .order_by_desc(expenses::Column::ExpenseDate)
            .all(&self.db)
            .await?)
    }

    /// Updates an expense.
    pub async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        patch: UpdateExpenseInput,
    ) -> Result<expenses::Model, ExpenseError> {
        let existing = self.find_by_id(user_id, expense_id).await?;

        if let Some(amount) = patch.amount
            && amount <= Decimal::ZERO
        {
            return Err(ExpenseError::NonPositiveAmount);
        }
        if let Some(category_id) = patch.category_id
            && category_id != existing.category_id
        {
            self.check_category(user_id, category_id).await?;
        }

        let mut active: expenses::ActiveModel = existing.into();
        if let Some(category_id) = patch.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = patch.expense_date {
            active.expense_date = Set(date);
        }
        if patch.clear_notes {
            active.notes = Set(None);
        } else if let Some(notes) = patch.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an expense.
    pub async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError> {
        let existing = self.find_by_id(user_id, expense_id).await?;

        expenses::Entity::delete_by_id(existing.id).exec(&self.db).await?;

        debug!(expense_id = %expense_id, "Expense deleted");

        Ok(())
    }

    async fn check_category(&self, user_id: Uuid, category_id: Uuid) -> Result<(), ExpenseError> {
        expense_categories::Entity::find_by_id(category_id)
            .filter(expense_categories::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::CategoryNotFound(category_id))?;
        Ok(())
    }
}
