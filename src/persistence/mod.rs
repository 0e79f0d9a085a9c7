//! Persistence layer: store traits plus PostgreSQL and in-memory backends.
//!
//! Services only see the traits. [`postgres::PostgresStore`] is the
//! production backend; [`memory::MemoryStore`] backs local development
//! (`PERSISTENCE_ENABLED=false`) and the test suite.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    Customer, CustomerId, Expense, ExpenseId, NewExpense, NewRegularPayment, Page, PageRequest,
    RegularPayment, RegularPaymentId, RegularPaymentPatch, UserId,
};
use crate::error::GatewayError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Optional owner restriction for recurring payment listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegularPaymentFilter {
    /// Restrict to one customer's payments.
    pub customer_id: Option<CustomerId>,
}

/// Optional owner restriction for expense listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// Restrict to one customer's expenses.
    pub customer_id: Option<CustomerId>,
}

/// Storage for recurring payment records.
///
/// `None` results signal "no such row" and are not errors.
#[async_trait]
pub trait RegularPaymentStore: Send + Sync + fmt::Debug {
    /// Returns one page of payments matching `filter`, plus the total match
    /// count.
    async fn find_many(
        &self,
        filter: RegularPaymentFilter,
        page: PageRequest,
    ) -> Result<Page<RegularPayment>, GatewayError>;

    /// Loads a single payment.
    async fn find_one(&self, id: RegularPaymentId)
    -> Result<Option<RegularPayment>, GatewayError>;

    /// Loads every payment, unpaged. Used by the monthly sweep.
    async fn find_all(&self) -> Result<Vec<RegularPayment>, GatewayError>;

    /// Inserts a payment. Fails with [`GatewayError::ConstraintViolation`]
    /// if the customer does not exist.
    async fn create(&self, new: NewRegularPayment) -> Result<RegularPayment, GatewayError>;

    /// Applies a partial update.
    async fn update(
        &self,
        id: RegularPaymentId,
        patch: RegularPaymentPatch,
    ) -> Result<Option<RegularPayment>, GatewayError>;

    /// Deletes a payment, returning the removed row.
    async fn delete(&self, id: RegularPaymentId)
    -> Result<Option<RegularPayment>, GatewayError>;
}

/// Storage for expense records.
#[async_trait]
pub trait ExpenseStore: Send + Sync + fmt::Debug {
    /// Returns one page of expenses matching `filter`.
    async fn find_many(
        &self,
        filter: ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<Expense>, GatewayError>;

    /// Loads a single expense.
    async fn find_one(&self, id: ExpenseId) -> Result<Option<Expense>, GatewayError>;

    /// Inserts one expense.
    async fn create(&self, new: NewExpense) -> Result<Expense, GatewayError>;

    /// Inserts all rows in one transaction. Either every row is stored or
    /// none is. Returns the number of rows inserted.
    async fn create_many(&self, rows: Vec<NewExpense>) -> Result<u64, GatewayError>;
}

/// Customer lookup used to resolve the caller's own customer id.
#[async_trait]
pub trait CustomerDirectory: Send + Sync + fmt::Debug {
    /// Resolves the customer owned by `user_id`.
    ///
    /// Fails with [`GatewayError::NotFound`] if the user has no profile.
    async fn find_one_by_user_id(&self, user_id: UserId) -> Result<Customer, GatewayError>;

    /// Creates the profile for `user_id`.
    ///
    /// Fails with [`GatewayError::ConstraintViolation`] if one exists.
    async fn create(&self, user_id: UserId, name: String) -> Result<Customer, GatewayError>;
}

/// Maps a sqlx error onto the gateway taxonomy: integrity violations become
/// [`GatewayError::ConstraintViolation`], everything else
/// [`GatewayError::Storage`].
#[must_use]
pub fn map_sqlx_error(err: sqlx::Error) -> GatewayError {
    use sqlx::error::ErrorKind;

    if let sqlx::Error::Database(db) = &err {
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => {
                return GatewayError::ConstraintViolation(db.message().to_string());
            }
            _ => {}
        }
    }
    GatewayError::Storage(err.to_string())
}
