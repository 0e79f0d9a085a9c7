//! Recurring payment service: CRUD with ownership checks, schedule sync,
//! and the bulk monthly apply.
//!
//! Every successful create or update upserts the payment's monthly job in
//! the external scheduler, and delete removes it. The database write always
//! completes before the scheduler is contacted, so a rejected write never
//! creates a job. When the scheduler call fails after a successful write,
//! the write is compensated (deleted or reverted) and the scheduler error is
//! returned.

use std::sync::Arc;

use crate::domain::job::regular_payment_job_name;
use crate::domain::{
    AuthContext, NewExpense, Page, PageRequest, RegularPayment, RegularPaymentDraft,
    RegularPaymentId, RegularPaymentPatch, ScheduledTask, UserId,
};
use crate::error::GatewayError;
use crate::persistence::{CustomerDirectory, RegularPaymentFilter, RegularPaymentStore};
use crate::scheduler::{CallbackSettings, JobScheduler};
use crate::service::ExpenseService;

const ENTITY: &str = "regular payment";

/// Orchestration layer for recurring payments.
///
/// Stateless coordinator over the payment store, the customer directory,
/// the external scheduler, and the expense service.
#[derive(Debug, Clone)]
pub struct RegularPaymentService {
    store: Arc<dyn RegularPaymentStore>,
    customers: Arc<dyn CustomerDirectory>,
    scheduler: Arc<dyn JobScheduler>,
    expenses: ExpenseService,
    callbacks: CallbackSettings,
}

impl RegularPaymentService {
    /// Creates a new `RegularPaymentService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RegularPaymentStore>,
        customers: Arc<dyn CustomerDirectory>,
        scheduler: Arc<dyn JobScheduler>,
        expenses: ExpenseService,
        callbacks: CallbackSettings,
    ) -> Self {
        Self {
            store,
            customers,
            scheduler,
            expenses,
            callbacks,
        }
    }

    /// Lists every customer's payments.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on database failure.
    pub async fn find_many_as_admin(
        &self,
        page: PageRequest,
    ) -> Result<Page<RegularPayment>, GatewayError> {
        self.store
            .find_many(RegularPaymentFilter::default(), page)
            .await
    }

    /// Lists the caller's own payments.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the caller has no customer
    /// profile.
    pub async fn find_many_as_customer(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<RegularPayment>, GatewayError> {
        let customer = self.customers.find_one_by_user_id(user_id).await?;
        let filter = RegularPaymentFilter {
            customer_id: Some(customer.id),
        };
        self.store.find_many(filter, page).await
    }

    /// Lists payments visible to `auth`: all of them for admins, the
    /// caller's own otherwise.
    ///
    /// # Errors
    ///
    /// See [`Self::find_many_as_customer`].
    pub async fn find_many_for(
        &self,
        auth: &AuthContext,
        page: PageRequest,
    ) -> Result<Page<RegularPayment>, GatewayError> {
        if auth.is_admin() {
            self.find_many_as_admin(page).await
        } else {
            self.find_many_as_customer(auth.user_id, page).await
        }
    }

    /// Loads any payment, bypassing ownership.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the payment does not exist.
    pub async fn find_one_as_admin(
        &self,
        id: RegularPaymentId,
    ) -> Result<RegularPayment, GatewayError> {
        self.store
            .find_one(id)
            .await?
            .ok_or(GatewayError::NotFound(ENTITY))
    }

    /// Loads a payment owned by `user_id`.
    ///
    /// The payment and the caller's customer profile are fetched
    /// concurrently. Absence of either, and a payment owned by someone
    /// else, all produce the same [`GatewayError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] as described above.
    pub async fn find_one_as_customer(
        &self,
        id: RegularPaymentId,
        user_id: UserId,
    ) -> Result<RegularPayment, GatewayError> {
        let (payment, customer) = tokio::join!(
            self.store.find_one(id),
            self.customers.find_one_by_user_id(user_id)
        );
        let customer = customer.map_err(hide_missing_owner)?;
        match payment? {
            Some(payment) if payment.customer_id == customer.id => Ok(payment),
            _ => Err(GatewayError::NotFound(ENTITY)),
        }
    }

    /// Loads a payment visible to `auth`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if absent or not owned.
    pub async fn find_one_for(
        &self,
        id: RegularPaymentId,
        auth: &AuthContext,
    ) -> Result<RegularPayment, GatewayError> {
        if auth.is_admin() {
            self.find_one_as_admin(id).await
        } else {
            self.find_one_as_customer(id, auth.user_id).await
        }
    }

    /// Creates a payment owned by `user_id` and schedules its monthly job.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] for a negative amount.
    /// - [`GatewayError::NotFound`] if the caller has no customer profile.
    /// - Store errors from the insert; the scheduler is not contacted.
    /// - [`GatewayError::SchedulerCreateFailure`] if the job cannot be
    ///   created; the inserted payment is deleted again.
    pub async fn create(
        &self,
        draft: RegularPaymentDraft,
        user_id: UserId,
    ) -> Result<RegularPayment, GatewayError> {
        draft.validate()?;
        let customer = self.customers.find_one_by_user_id(user_id).await?;
        let payment = self.store.create(draft.for_customer(customer.id)).await?;

        if let Err(err) = self.sync_schedule(&payment).await {
            self.compensate_create(&payment).await;
            return Err(err);
        }

        tracing::info!(
            payment_id = %payment.id,
            customer_id = %payment.customer_id,
            charge_day = payment.charge_day(),
            "regular payment created"
        );
        Ok(payment)
    }

    /// Applies a partial update and re-syncs the monthly job.
    ///
    /// Ownership is checked before anything is written.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] for an empty patch or negative
    ///   amount.
    /// - [`GatewayError::NotFound`] if absent, not owned, or gone by the
    ///   time of the write.
    /// - [`GatewayError::SchedulerCreateFailure`] if the job cannot be
    ///   replaced; the previous field values are restored.
    pub async fn update(
        &self,
        id: RegularPaymentId,
        patch: RegularPaymentPatch,
        auth: &AuthContext,
    ) -> Result<RegularPayment, GatewayError> {
        patch.validate()?;
        let previous = self.find_one_for(id, auth).await?;

        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or(GatewayError::NotFound(ENTITY))?;

        if let Err(err) = self.sync_schedule(&updated).await {
            self.compensate_update(&previous).await;
            return Err(err);
        }

        tracing::info!(
            payment_id = %updated.id,
            charge_day = updated.charge_day(),
            "regular payment updated"
        );
        Ok(updated)
    }

    /// Deletes a payment and its monthly job.
    ///
    /// A failure to delete the job is logged and does not fail the call:
    /// the payment is already gone, and a stale job resolves to
    /// [`GatewayError::NotFound`] when it fires.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if absent or not owned.
    pub async fn delete(
        &self,
        id: RegularPaymentId,
        auth: &AuthContext,
    ) -> Result<RegularPayment, GatewayError> {
        self.find_one_for(id, auth).await?;

        let removed = self
            .store
            .delete(id)
            .await?
            .ok_or(GatewayError::NotFound(ENTITY))?;

        let job_name = regular_payment_job_name(id);
        if let Err(err) = self.scheduler.delete_job(&job_name).await {
            tracing::warn!(
                payment_id = %id,
                job_name = %job_name,
                error = %err,
                details = ?err.details(),
                "payment deleted but its scheduled job was not"
            );
        }

        tracing::info!(payment_id = %id, "regular payment deleted");
        Ok(removed)
    }

    /// Materializes every recurring payment into one expense each, in a
    /// single all-or-nothing batch. Returns the number of expenses created.
    ///
    /// # Errors
    ///
    /// Returns the store error that aborted the batch; no expense is
    /// written in that case.
    pub async fn apply_regular_payments(&self) -> Result<u64, GatewayError> {
        let payments = self.store.find_all().await?;
        if payments.is_empty() {
            return Ok(0);
        }

        let rows: Vec<NewExpense> = payments.iter().map(RegularPayment::to_new_expense).collect();
        self.expenses.create_many_via_transaction(rows).await
    }

    /// Upserts the monthly apply job for `payment`, keyed by its id and
    /// firing on the day of month of its charge date.
    async fn sync_schedule(&self, payment: &RegularPayment) -> Result<(), GatewayError> {
        let task = ScheduledTask::RegularPaymentApply {
            regular_payment_id: payment.id,
        };
        let day = u8::try_from(payment.charge_day())
            .map_err(|_| GatewayError::Internal("day of month out of range".to_string()))?;
        let job = self.callbacks.monthly_job(&task, day)?;
        self.scheduler.upsert_job(job).await
    }

    async fn compensate_create(&self, payment: &RegularPayment) {
        match self.store.delete(payment.id).await {
            Ok(_) => tracing::warn!(
                payment_id = %payment.id,
                "scheduling failed; created payment rolled back"
            ),
            Err(err) => tracing::error!(
                payment_id = %payment.id,
                error = %err,
                "scheduling failed and the created payment could not be rolled back"
            ),
        }
    }

    async fn compensate_update(&self, previous: &RegularPayment) {
        match self
            .store
            .update(previous.id, RegularPaymentPatch::restoring(previous))
            .await
        {
            Ok(_) => tracing::warn!(
                payment_id = %previous.id,
                "scheduling failed; update reverted"
            ),
            Err(err) => tracing::error!(
                payment_id = %previous.id,
                error = %err,
                "scheduling failed and the update could not be reverted"
            ),
        }
    }
}

fn hide_missing_owner(err: GatewayError) -> GatewayError {
    match err {
        GatewayError::NotFound(_) => GatewayError::NotFound(ENTITY),
        other => other,
    }
}
