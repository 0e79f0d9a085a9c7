//! External job scheduler integration.
//!
//! The scheduler is a cron-as-a-service: it stores named jobs, and on each
//! tick of a job's schedule it performs an HTTP callback. Jobs are keyed by
//! name and `upsert_job` replaces any job already stored under that name,
//! which is what keeps at most one job per recurring payment.
//!
//! [`http::HttpJobScheduler`] talks to the real service;
//! [`memory::InMemoryScheduler`] keeps jobs in process for local runs and
//! tests.

pub mod http;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CronSchedule, ScheduledTask};
use crate::error::GatewayError;

pub use http::HttpJobScheduler;
pub use memory::InMemoryScheduler;

/// Header carrying the shared callback secret.
pub const JOB_SECRET_HEADER: &str = "x-job-secret";

/// HTTP request the scheduler performs when a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpExecutor {
    /// Callback URL.
    pub url: String,
    /// HTTP method, always `POST` for jobs created here.
    pub method: String,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded request body.
    pub body: String,
}

/// A job as stored by the external scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    /// Unique job name; upserts replace by name.
    pub name: String,
    /// Five-field cron expression.
    #[schema(value_type = String, example = "0 0 15 * *")]
    pub schedule: CronSchedule,
    /// Times the scheduler retries a failed callback.
    pub retries: u32,
    /// Callback performed on every tick.
    pub executor: HttpExecutor,
}

/// Client for the external job scheduler.
#[async_trait]
pub trait JobScheduler: Send + Sync + fmt::Debug {
    /// Creates the job, or replaces the job already stored under
    /// `job.name`.
    ///
    /// Fails with [`GatewayError::SchedulerCreateFailure`] once retries are
    /// exhausted.
    async fn upsert_job(&self, job: JobDefinition) -> Result<(), GatewayError>;

    /// Deletes a job by name. A job that does not exist counts as deleted.
    ///
    /// Fails with [`GatewayError::SchedulerDeleteFailure`] for any other
    /// failure.
    async fn delete_job(&self, name: &str) -> Result<(), GatewayError>;

    /// Lists jobs whose name starts with `query`.
    async fn find_jobs(&self, query: &str) -> Result<Vec<JobDefinition>, GatewayError>;
}

/// Where and how scheduled jobs call back into this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackSettings {
    /// Absolute URL of `POST /jobs/execute`.
    pub url: String,
    /// Shared secret sent in [`JOB_SECRET_HEADER`], if configured.
    pub secret: Option<String>,
    /// Callback retries requested from the scheduler.
    pub retries: u32,
    /// UTC hour at which monthly jobs fire.
    pub charge_hour: u8,
    /// UTC minute at which monthly jobs fire.
    pub charge_minute: u8,
}

impl CallbackSettings {
    /// Builds the monthly job definition for `task`, firing on
    /// `day_of_month`. The callback body is the task's JSON
    /// [`JobEnvelope`](crate::domain::JobEnvelope).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the day or time is out of
    /// range, or [`GatewayError::Internal`] if the body cannot be encoded.
    pub fn monthly_job(
        &self,
        task: &ScheduledTask,
        day_of_month: u8,
    ) -> Result<JobDefinition, GatewayError> {
        let schedule = CronSchedule::monthly(day_of_month, self.charge_hour, self.charge_minute)?;
        let body = serde_json::to_string(&task.to_envelope()?)
            .map_err(|e| GatewayError::Internal(format!("cannot encode job body: {e}")))?;

        let mut headers = BTreeMap::from([(
            "content-type".to_string(),
            "application/json".to_string(),
        )]);
        if let Some(secret) = &self.secret {
            headers.insert(JOB_SECRET_HEADER.to_string(), secret.clone());
        }

        Ok(JobDefinition {
            name: task.job_name(),
            schedule,
            retries: self.retries,
            executor: HttpExecutor {
                url: self.url.clone(),
                method: "POST".to_string(),
                headers,
                body,
            },
        })
    }
}
