//! In-memory store with the same contracts as the PostgreSQL backend.
//!
//! Each table is a `HashMap` behind its own [`tokio::sync::RwLock`].
//! Foreign keys to `customers` are checked on insert so integrity failures
//! surface as [`GatewayError::ConstraintViolation`] exactly like they do in
//! SQL. Locks are always taken in the order customers → regular payments →
//! expenses.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    CustomerDirectory, ExpenseFilter, ExpenseStore, RegularPaymentFilter, RegularPaymentStore,
};
use crate::domain::{
    Customer, CustomerId, Expense, ExpenseId, NewExpense, NewRegularPayment, Page, PageRequest,
    RegularPayment, RegularPaymentId, RegularPaymentPatch, UserId,
};
use crate::error::GatewayError;

/// Process-local store for development and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: RwLock<HashMap<CustomerId, Customer>>,
    regular_payments: RwLock<HashMap<RegularPaymentId, RegularPayment>>,
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored expenses.
    pub async fn expense_count(&self) -> usize {
        self.expenses.read().await.len()
    }
}

fn missing_customer(customer_id: CustomerId) -> GatewayError {
    GatewayError::ConstraintViolation(format!("customer {customer_id} does not exist"))
}

/// Slices an already-sorted list into the requested page.
fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    Page {
        items: items.into_iter().skip(offset).take(limit).collect(),
        total,
    }
}

#[async_trait]
impl RegularPaymentStore for MemoryStore {
    async fn find_many(
        &self,
        filter: RegularPaymentFilter,
        page: PageRequest,
    ) -> Result<Page<RegularPayment>, GatewayError> {
        let map = self.regular_payments.read().await;
        let mut matching: Vec<RegularPayment> = map
            .values()
            .filter(|p| filter.customer_id.is_none_or(|c| p.customer_id == c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }

    async fn find_one(
        &self,
        id: RegularPaymentId,
    ) -> Result<Option<RegularPayment>, GatewayError> {
        Ok(self.regular_payments.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<RegularPayment>, GatewayError> {
        let mut all: Vec<RegularPayment> =
            self.regular_payments.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn create(&self, new: NewRegularPayment) -> Result<RegularPayment, GatewayError> {
        new.validate()?;
        let customers = self.customers.read().await;
        if !customers.contains_key(&new.customer_id) {
            return Err(missing_customer(new.customer_id));
        }

        let now = Utc::now();
        let payment = RegularPayment {
            id: RegularPaymentId::new(),
            customer_id: new.customer_id,
            amount: new.amount,
            category: new.category,
            date_of_charge: new.date_of_charge,
            created_at: now,
            updated_at: now,
        };
        self.regular_payments
            .write()
            .await
            .insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update(
        &self,
        id: RegularPaymentId,
        patch: RegularPaymentPatch,
    ) -> Result<Option<RegularPayment>, GatewayError> {
        let mut map = self.regular_payments.write().await;
        Ok(map.get_mut(&id).map(|payment| {
            patch.apply_to(payment);
            payment.clone()
        }))
    }

    async fn delete(
        &self,
        id: RegularPaymentId,
    ) -> Result<Option<RegularPayment>, GatewayError> {
        Ok(self.regular_payments.write().await.remove(&id))
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn find_many(
        &self,
        filter: ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<Expense>, GatewayError> {
        let map = self.expenses.read().await;
        let mut matching: Vec<Expense> = map
            .values()
            .filter(|e| filter.customer_id.is_none_or(|c| e.customer_id == c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        Ok(paginate(matching, page))
    }

    async fn find_one(&self, id: ExpenseId) -> Result<Option<Expense>, GatewayError> {
        Ok(self.expenses.read().await.get(&id).cloned())
    }

    async fn create(&self, new: NewExpense) -> Result<Expense, GatewayError> {
        let customers = self.customers.read().await;
        if !customers.contains_key(&new.customer_id) {
            return Err(missing_customer(new.customer_id));
        }

        let expense = new.into_expense();
        self.expenses
            .write()
            .await
            .insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn create_many(&self, rows: Vec<NewExpense>) -> Result<u64, GatewayError> {
        let customers = self.customers.read().await;
        // Validate the whole batch before touching the table.
        if let Some(bad) = rows
            .iter()
            .find(|row| !customers.contains_key(&row.customer_id))
        {
            return Err(missing_customer(bad.customer_id));
        }

        let mut expenses = self.expenses.write().await;
        let mut inserted = 0u64;
        for row in rows {
            let expense = row.into_expense();
            expenses.insert(expense.id, expense);
            inserted += 1;
        }
        Ok(inserted)
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn find_one_by_user_id(&self, user_id: UserId) -> Result<Customer, GatewayError> {
        self.customers
            .read()
            .await
            .values()
            .find(|c| c.user_id == user_id)
            .cloned()
            .ok_or(GatewayError::NotFound("customer"))
    }

    async fn create(&self, user_id: UserId, name: String) -> Result<Customer, GatewayError> {
        let mut map = self.customers.write().await;
        if map.values().any(|c| c.user_id == user_id) {
            return Err(GatewayError::ConstraintViolation(format!(
                "user {user_id} already has a customer profile"
            )));
        }
        let customer = Customer {
            id: CustomerId::new(),
            user_id,
            name,
            created_at: Utc::now(),
        };
        map.insert(customer.id, customer.clone());
        Ok(customer)
    }
}
