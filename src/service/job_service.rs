//! Scheduler callback execution and job listing.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Expense, JobEnvelope, ScheduledTask};
use crate::error::GatewayError;
use crate::scheduler::{JobDefinition, JobScheduler};
use crate::service::{ExpenseService, NewExpenseInput, RegularPaymentService};

/// Dispatches decoded scheduler callbacks to the owning service.
#[derive(Debug, Clone)]
pub struct JobService {
    payments: RegularPaymentService,
    expenses: ExpenseService,
    scheduler: Arc<dyn JobScheduler>,
}

impl JobService {
    /// Creates a new `JobService`.
    #[must_use]
    pub fn new(
        payments: RegularPaymentService,
        expenses: ExpenseService,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            payments,
            expenses,
            scheduler,
        }
    }

    /// Executes one job fired now. See [`Self::execute_at`].
    ///
    /// # Errors
    ///
    /// See [`Self::execute_at`].
    pub async fn execute(&self, envelope: &JobEnvelope) -> Result<Option<Expense>, GatewayError> {
        self.execute_at(envelope, Utc::now()).await
    }

    /// Executes one job fired at `now` and returns the expense it produced.
    ///
    /// A due `regular-payment-apply` job writes exactly one expense dated
    /// at the payment's charge date, with its owner, amount, and category
    /// copied verbatim. Extra firings of a charge day past the 28th are
    /// not due and write nothing (`Ok(None)`).
    ///
    /// # Errors
    ///
    /// - [`GatewayError::UnknownJobType`] for a job type this service does
    ///   not schedule.
    /// - [`GatewayError::InvalidRequest`] for a malformed payload.
    /// - [`GatewayError::NotFound`] if the payment was deleted; no expense
    ///   is written.
    pub async fn execute_at(
        &self,
        envelope: &JobEnvelope,
        now: DateTime<Utc>,
    ) -> Result<Option<Expense>, GatewayError> {
        let task = ScheduledTask::from_envelope(envelope).inspect_err(|err| {
            tracing::warn!(
                job_type = %envelope.job_type,
                job_name = %envelope.job_name,
                error = %err,
                "rejected job callback"
            );
        })?;

        if envelope.job_name != task.job_name() {
            tracing::warn!(
                job_name = %envelope.job_name,
                expected = %task.job_name(),
                "job name does not match payload"
            );
        }

        match task {
            ScheduledTask::RegularPaymentApply { regular_payment_id } => {
                let payment = self
                    .payments
                    .find_one_as_admin(regular_payment_id)
                    .await
                    .inspect_err(|err| {
                        tracing::warn!(
                            payment_id = %regular_payment_id,
                            error = %err,
                            "job fired for an unavailable payment"
                        );
                    })?;

                if !payment.is_due_on(now) {
                    tracing::debug!(
                        payment_id = %regular_payment_id,
                        charge_day = payment.charge_day(),
                        "payment not due today"
                    );
                    return Ok(None);
                }

                let input = NewExpenseInput {
                    date: payment.date_of_charge,
                    amount: payment.amount,
                    category: payment.category,
                };
                let expense = self.expenses.create_one(input, payment.customer_id).await?;
                tracing::info!(
                    payment_id = %regular_payment_id,
                    expense_id = %expense.id,
                    "regular payment applied"
                );
                Ok(Some(expense))
            }
        }
    }

    /// Lists scheduler jobs whose name starts with `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the scheduler cannot be reached.
    pub async fn find_jobs(&self, query: &str) -> Result<Vec<JobDefinition>, GatewayError> {
        self.scheduler.find_jobs(query).await
    }
}
