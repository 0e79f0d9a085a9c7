//! Concrete expense records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, CustomerId, ExpenseId};

/// A stored expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Expense {
    /// Server-generated identifier.
    pub id: ExpenseId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Amount spent.
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Amount spent.
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// When the expense happened.
    pub date: DateTime<Utc>,
}

impl NewExpense {
    /// Turns the payload into a full record with fresh id and timestamps.
    #[must_use]
    pub fn into_expense(self) -> Expense {
        let now = Utc::now();
        Expense {
            id: ExpenseId::new(),
            customer_id: self.customer_id,
            amount: self.amount,
            category: self.category,
            date: self.date,
            created_at: now,
            updated_at: now,
        }
    }
}
