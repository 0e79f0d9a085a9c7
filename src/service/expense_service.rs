//! Expense service: expense reads plus the materialization entry points used
//! by the job endpoint and the monthly sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    AuthContext, Category, CustomerId, Expense, ExpenseId, NewExpense, Page, PageRequest, UserId,
};
use crate::error::GatewayError;
use crate::persistence::{CustomerDirectory, ExpenseFilter, ExpenseStore};

const ENTITY: &str = "expense";

/// Fields of a single materialized expense; the owner is passed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewExpenseInput {
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Amount spent.
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
}

/// Expense reads and writes.
#[derive(Debug, Clone)]
pub struct ExpenseService {
    store: Arc<dyn ExpenseStore>,
    customers: Arc<dyn CustomerDirectory>,
}

impl ExpenseService {
    /// Creates a new `ExpenseService`.
    #[must_use]
    pub fn new(store: Arc<dyn ExpenseStore>, customers: Arc<dyn CustomerDirectory>) -> Self {
        Self { store, customers }
    }

    /// Inserts one expense for `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConstraintViolation`] if the customer does
    /// not exist, or [`GatewayError::Storage`] on database failure.
    pub async fn create_one(
        &self,
        input: NewExpenseInput,
        customer_id: CustomerId,
    ) -> Result<Expense, GatewayError> {
        let expense = self
            .store
            .create(NewExpense {
                customer_id,
                amount: input.amount,
                category: input.category,
                date: input.date,
            })
            .await?;
        tracing::info!(expense_id = %expense.id, %customer_id, amount = %expense.amount, "expense created");
        Ok(expense)
    }

    /// Inserts all rows in a single transaction and returns the count.
    /// If any row is rejected, none is stored.
    ///
    /// # Errors
    ///
    /// Returns the first row's [`GatewayError::ConstraintViolation`] or a
    /// [`GatewayError::Storage`] failure; the batch is rolled back either way.
    pub async fn create_many_via_transaction(
        &self,
        rows: Vec<NewExpense>,
    ) -> Result<u64, GatewayError> {
        let requested = rows.len();
        let inserted = self.store.create_many(rows).await?;
        tracing::info!(requested, inserted, "expense batch committed");
        Ok(inserted)
    }

    /// Lists every customer's expenses.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on database failure.
    pub async fn find_many_as_admin(
        &self,
        page: PageRequest,
    ) -> Result<Page<Expense>, GatewayError> {
        self.store.find_many(ExpenseFilter::default(), page).await
    }

    /// Lists the caller's own expenses.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the caller has no customer
    /// profile.
    pub async fn find_many_as_customer(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Expense>, GatewayError> {
        let customer = self.customers.find_one_by_user_id(user_id).await?;
        let filter = ExpenseFilter {
            customer_id: Some(customer.id),
        };
        self.store.find_many(filter, page).await
    }

    /// Lists expenses visible to `auth`.
    ///
    /// # Errors
    ///
    /// See [`Self::find_many_as_customer`].
    pub async fn find_many_for(
        &self,
        auth: &AuthContext,
        page: PageRequest,
    ) -> Result<Page<Expense>, GatewayError> {
        if auth.is_admin() {
            self.find_many_as_admin(page).await
        } else {
            self.find_many_as_customer(auth.user_id, page).await
        }
    }

    /// Loads any expense, bypassing ownership.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the expense does not exist.
    pub async fn find_one_as_admin(&self, id: ExpenseId) -> Result<Expense, GatewayError> {
        self.store
            .find_one(id)
            .await?
            .ok_or(GatewayError::NotFound(ENTITY))
    }

    /// Loads an expense owned by `user_id`. Absence and foreign ownership
    /// both yield [`GatewayError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] as described above.
    pub async fn find_one_as_customer(
        &self,
        id: ExpenseId,
        user_id: UserId,
    ) -> Result<Expense, GatewayError> {
        let (expense, customer) = tokio::join!(
            self.store.find_one(id),
            self.customers.find_one_by_user_id(user_id)
        );
        let customer = customer.map_err(hide_missing_owner)?;
        match expense? {
            Some(expense) if expense.customer_id == customer.id => Ok(expense),
            _ => Err(GatewayError::NotFound(ENTITY)),
        }
    }

    /// Loads an expense visible to `auth`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if absent or not owned.
    pub async fn find_one_for(
        &self,
        id: ExpenseId,
        auth: &AuthContext,
    ) -> Result<Expense, GatewayError> {
        if auth.is_admin() {
            self.find_one_as_admin(id).await
        } else {
            self.find_one_as_customer(id, auth.user_id).await
        }
    }
}

fn hide_missing_owner(err: GatewayError) -> GatewayError {
    match err {
        GatewayError::NotFound(_) => GatewayError::NotFound(ENTITY),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    async fn setup() -> (ExpenseService, Arc<MemoryStore>, UserId, CustomerId) {
        let store = Arc::new(MemoryStore::new());
        let user_id = UserId::new();
        let directory = Arc::clone(&store) as Arc<dyn CustomerDirectory>;
        let Ok(customer) = directory.create(user_id, "Ada".to_string()).await else {
            panic!("customer creation failed");
        };
        let service = ExpenseService::new(
            Arc::clone(&store) as Arc<dyn ExpenseStore>,
            Arc::clone(&store) as Arc<dyn CustomerDirectory>,
        );
        (service, store, user_id, customer.id)
    }

    fn input() -> NewExpenseInput {
        NewExpenseInput {
            date: Utc::now(),
            amount: Decimal::new(1999, 2),
            category: Category::Entertainment,
        }
    }

    #[tokio::test]
    async fn create_one_assigns_owner() {
        let (service, _, user_id, customer_id) = setup().await;
        let Ok(expense) = service.create_one(input(), customer_id).await else {
            panic!("create failed");
        };
        assert_eq!(expense.customer_id, customer_id);

        let auth = AuthContext::customer(user_id);
        let Ok(found) = service.find_one_for(expense.id, &auth).await else {
            panic!("owner should see expense");
        };
        assert_eq!(found, expense);
    }

    #[tokio::test]
    async fn foreign_expense_is_not_found() {
        let (service, store, _, customer_id) = setup().await;
        let Ok(expense) = service.create_one(input(), customer_id).await else {
            panic!("create failed");
        };

        let stranger = UserId::new();
        let directory: Arc<dyn CustomerDirectory> = store;
        let Ok(_) = directory.create(stranger, "Eve".to_string()).await else {
            panic!("customer creation failed");
        };
        let result = service
            .find_one_for(expense.id, &AuthContext::customer(stranger))
            .await;
        assert!(matches!(result, Err(GatewayError::NotFound("expense"))));

        let admin = AuthContext::admin(UserId::new());
        assert!(service.find_one_for(expense.id, &admin).await.is_ok());
    }

    #[tokio::test]
    async fn batch_with_invalid_row_stores_nothing() {
        let (service, store, _, customer_id) = setup().await;
        let row = |customer_id| NewExpense {
            customer_id,
            amount: Decimal::TEN,
            category: Category::Housing,
            date: Utc::now(),
        };
        let result = service
            .create_many_via_transaction(vec![row(customer_id), row(CustomerId::new())])
            .await;
        tokio_test::assert_err!(result);
        assert_eq!(store.expense_count().await, 0);
    }
}
