//! DTOs for expense endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::{Category, CustomerId, Expense, ExpenseId};

/// An expense as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDto {
    /// Expense identifier.
    pub id: ExpenseId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Amount spent.
    #[schema(value_type = String, example = "49.99")]
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseDto {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            customer_id: expense.customer_id,
            amount: expense.amount,
            category: expense.category,
            date: expense.date,
            created_at: expense.created_at,
        }
    }
}

/// Paginated expense list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseListResponse {
    /// Expenses on this page.
    pub data: Vec<ExpenseDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
