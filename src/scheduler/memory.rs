//! In-process scheduler used when `SCHEDULER_ENABLED=false` and by tests.
//!
//! Jobs are stored by name; nothing ever fires. Failures can be injected to
//! exercise the service's compensation paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{JobDefinition, JobScheduler};
use crate::error::GatewayError;

/// Job table held in memory.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    jobs: RwLock<BTreeMap<String, JobDefinition>>,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
    upsert_calls: AtomicUsize,
}

impl InMemoryScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `upsert_job` fail (or succeed again).
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete_job` fail (or succeed again).
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of `upsert_job` calls received, failed ones included.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Returns the job stored under `name`.
    pub async fn job(&self, name: &str) -> Option<JobDefinition> {
        self.jobs.read().await.get(name).cloned()
    }

    /// Number of stored jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Returns `true` if no job is stored.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobScheduler for InMemoryScheduler {
    async fn upsert_job(&self, job: JobDefinition) -> Result<(), GatewayError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(GatewayError::SchedulerCreateFailure {
                job_name: job.name,
                reason: "scheduler unavailable".to_string(),
            });
        }
        tracing::info!(job_name = %job.name, schedule = %job.schedule, "job stored in memory");
        self.jobs.write().await.insert(job.name.clone(), job);
        Ok(())
    }

    async fn delete_job(&self, name: &str) -> Result<(), GatewayError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(GatewayError::SchedulerDeleteFailure {
                job_name: name.to_string(),
                reason: "scheduler unavailable".to_string(),
            });
        }
        self.jobs.write().await.remove(name);
        Ok(())
    }

    async fn find_jobs(&self, query: &str) -> Result<Vec<JobDefinition>, GatewayError> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.name.starts_with(query))
            .cloned()
            .collect())
    }
}
