//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::{CustomerDirectory, ExpenseStore, RegularPaymentStore};
use crate::scheduler::{CallbackSettings, JobScheduler};
use crate::service::{CustomerService, ExpenseService, JobService, RegularPaymentService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Recurring payment CRUD and schedule sync.
    pub regular_payments: RegularPaymentService,
    /// Expense reads.
    pub expenses: ExpenseService,
    /// Customer profiles.
    pub customers: CustomerService,
    /// Scheduler callback execution.
    pub jobs: JobService,
    /// HMAC secret for access tokens.
    pub jwt_secret: Arc<str>,
    /// Secret the scheduler must present on `POST /jobs/execute`.
    pub job_secret: Option<Arc<str>>,
}

/// Backends the services are wired over.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Recurring payment storage.
    pub regular_payments: Arc<dyn RegularPaymentStore>,
    /// Expense storage.
    pub expenses: Arc<dyn ExpenseStore>,
    /// Customer lookup.
    pub customers: Arc<dyn CustomerDirectory>,
    /// External job scheduler.
    pub scheduler: Arc<dyn JobScheduler>,
}

impl AppState {
    /// Wires every service over `backends`.
    #[must_use]
    pub fn new(backends: Backends, callbacks: CallbackSettings, jwt_secret: &str) -> Self {
        let job_secret = callbacks.secret.as_deref().map(Arc::<str>::from);
        let expenses = ExpenseService::new(
            Arc::clone(&backends.expenses),
            Arc::clone(&backends.customers),
        );
        let regular_payments = RegularPaymentService::new(
            backends.regular_payments,
            Arc::clone(&backends.customers),
            Arc::clone(&backends.scheduler),
            expenses.clone(),
            callbacks,
        );
        let jobs = JobService::new(
            regular_payments.clone(),
            expenses.clone(),
            backends.scheduler,
        );

        Self {
            regular_payments,
            expenses,
            customers: CustomerService::new(backends.customers),
            jobs,
            jwt_secret: Arc::from(jwt_secret),
            job_secret,
        }
    }
}
