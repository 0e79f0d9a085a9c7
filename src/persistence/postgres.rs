//! PostgreSQL implementation of the store traits.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{
    CustomerDirectory, ExpenseFilter, ExpenseStore, RegularPaymentFilter, RegularPaymentStore,
    map_sqlx_error,
};
use crate::config::GatewayConfig;
use crate::domain::{
    Customer, CustomerId, Expense, ExpenseId, NewExpense, NewRegularPayment, Page, PageRequest,
    RegularPayment, RegularPaymentId, RegularPaymentPatch, UserId,
};
use crate::error::GatewayError;

const REGULAR_PAYMENT_COLUMNS: &str =
    "id, customer_id, amount, category, date_of_charge, created_at, updated_at";
const EXPENSE_COLUMNS: &str = "id, customer_id, amount, category, date, created_at, updated_at";

/// PostgreSQL-backed store using a shared `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] if the database is unreachable.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies pending migrations from `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::Storage(format!("migration failed: {e}")))
    }
}

fn limit_offset(page: PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit()).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[async_trait]
impl RegularPaymentStore for PostgresStore {
    async fn find_many(
        &self,
        filter: RegularPaymentFilter,
        page: PageRequest,
    ) -> Result<Page<RegularPayment>, GatewayError> {
        let (limit, offset) = limit_offset(page);

        let items = sqlx::query_as::<_, RegularPayment>(&format!(
            "SELECT {REGULAR_PAYMENT_COLUMNS} FROM regular_payments \
             WHERE ($1::uuid IS NULL OR customer_id = $1) \
             ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(filter.customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM regular_payments WHERE ($1::uuid IS NULL OR customer_id = $1)",
        )
        .bind(filter.customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Page {
            items,
            total: count_to_u64(total),
        })
    }

    async fn find_one(
        &self,
        id: RegularPaymentId,
    ) -> Result<Option<RegularPayment>, GatewayError> {
        sqlx::query_as::<_, RegularPayment>(&format!(
            "SELECT {REGULAR_PAYMENT_COLUMNS} FROM regular_payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_all(&self) -> Result<Vec<RegularPayment>, GatewayError> {
        sqlx::query_as::<_, RegularPayment>(&format!(
            "SELECT {REGULAR_PAYMENT_COLUMNS} FROM regular_payments ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn create(&self, new: NewRegularPayment) -> Result<RegularPayment, GatewayError> {
        new.validate()?;
        sqlx::query_as::<_, RegularPayment>(&format!(
            "INSERT INTO regular_payments (id, customer_id, amount, category, date_of_charge) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REGULAR_PAYMENT_COLUMNS}"
        ))
        .bind(RegularPaymentId::new())
        .bind(new.customer_id)
        .bind(new.amount)
        .bind(new.category)
        .bind(new.date_of_charge)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn update(
        &self,
        id: RegularPaymentId,
        patch: RegularPaymentPatch,
    ) -> Result<Option<RegularPayment>, GatewayError> {
        sqlx::query_as::<_, RegularPayment>(&format!(
            "UPDATE regular_payments SET \
                amount = COALESCE($2, amount), \
                category = COALESCE($3, category), \
                date_of_charge = COALESCE($4, date_of_charge), \
                updated_at = now() \
             WHERE id = $1 RETURNING {REGULAR_PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.amount)
        .bind(patch.category)
        .bind(patch.date_of_charge)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete(
        &self,
        id: RegularPaymentId,
    ) -> Result<Option<RegularPayment>, GatewayError> {
        sqlx::query_as::<_, RegularPayment>(&format!(
            "DELETE FROM regular_payments WHERE id = $1 RETURNING {REGULAR_PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ExpenseStore for PostgresStore {
    async fn find_many(
        &self,
        filter: ExpenseFilter,
        page: PageRequest,
    ) -> Result<Page<Expense>, GatewayError> {
        let (limit, offset) = limit_offset(page);

        let items = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE ($1::uuid IS NULL OR customer_id = $1) \
             ORDER BY date DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(filter.customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM expenses WHERE ($1::uuid IS NULL OR customer_id = $1)",
        )
        .bind(filter.customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Page {
            items,
            total: count_to_u64(total),
        })
    }

    async fn find_one(&self, id: ExpenseId) -> Result<Option<Expense>, GatewayError> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn create(&self, new: NewExpense) -> Result<Expense, GatewayError> {
        sqlx::query_as::<_, Expense>(&format!(
            "INSERT INTO expenses (id, customer_id, amount, category, date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(ExpenseId::new())
        .bind(new.customer_id)
        .bind(new.amount)
        .bind(new.category)
        .bind(new.date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_many(&self, rows: Vec<NewExpense>) -> Result<u64, GatewayError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let mut inserted = 0u64;
        for row in rows {
            let result = sqlx::query(
                "INSERT INTO expenses (id, customer_id, amount, category, date) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(ExpenseId::new())
            .bind(row.customer_id)
            .bind(row.amount)
            .bind(row.category)
            .bind(row.date)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
            inserted += result.rows_affected();
        }

        // Dropping `tx` on an early return above rolls the batch back.
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(inserted)
    }
}

#[async_trait]
impl CustomerDirectory for PostgresStore {
    async fn find_one_by_user_id(&self, user_id: UserId) -> Result<Customer, GatewayError> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, user_id, name, created_at FROM customers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(GatewayError::NotFound("customer"))
    }

    async fn create(&self, user_id: UserId, name: String) -> Result<Customer, GatewayError> {
        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, user_id, name) VALUES ($1, $2, $3) \
             RETURNING id, user_id, name, created_at",
        )
        .bind(CustomerId::new())
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}
