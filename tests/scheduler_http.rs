//! `HttpJobScheduler` against a fake scheduler API served on an ephemeral
//! port.

#![allow(clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;

use finance_gateway::domain::{RegularPaymentId, ScheduledTask};
use finance_gateway::error::GatewayError;
use finance_gateway::scheduler::{CallbackSettings, HttpJobScheduler, JobDefinition, JobScheduler};

#[derive(Debug, Default)]
struct FakeScheduler {
    jobs: Mutex<BTreeMap<String, JobDefinition>>,
    /// Requests to answer with 503 before behaving normally.
    failures_left: AtomicU32,
    requests: AtomicU32,
    last_auth: Mutex<Option<String>>,
}

impl FakeScheduler {
    async fn record(&self, headers: &HeaderMap) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_auth.lock().await = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return false;
        }
        true
    }
}

#[derive(Debug, Deserialize)]
struct Search {
    #[serde(default)]
    q: String,
}

async fn upsert(
    State(fake): State<Arc<FakeScheduler>>,
    headers: HeaderMap,
    Json(job): Json<JobDefinition>,
) -> impl IntoResponse {
    if !fake.record(&headers).await {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    fake.jobs.lock().await.insert(job.name.clone(), job);
    StatusCode::CREATED
}

async fn search(
    State(fake): State<Arc<FakeScheduler>>,
    headers: HeaderMap,
    Query(search): Query<Search>,
) -> Result<Json<Vec<JobDefinition>>, StatusCode> {
    if !fake.record(&headers).await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let jobs = fake.jobs.lock().await;
    Ok(Json(
        jobs.values()
            .filter(|job| job.name.starts_with(&search.q))
            .cloned()
            .collect(),
    ))
}

async fn remove(
    State(fake): State<Arc<FakeScheduler>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> StatusCode {
    if !fake.record(&headers).await {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match fake.jobs.lock().await.remove(&name) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn spawn_fake() -> (Arc<FakeScheduler>, String) {
    let fake = Arc::new(FakeScheduler::default());
    let app = Router::new()
        .route("/jobs", get(search).post(upsert))
        .route("/jobs/{name}", delete(remove))
        .with_state(Arc::clone(&fake));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind fake scheduler");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (fake, format!("http://{addr}"))
}

fn client(base_url: &str, retries: u32) -> HttpJobScheduler {
    let Ok(client) = HttpJobScheduler::new(
        base_url,
        Some("sched-key".to_string()),
        retries,
        Duration::from_millis(5),
        Duration::from_secs(5),
    ) else {
        panic!("client should build");
    };
    client
}

fn monthly_job(day: u8) -> (ScheduledTask, JobDefinition) {
    let task = ScheduledTask::RegularPaymentApply {
        regular_payment_id: RegularPaymentId::new(),
    };
    let settings = CallbackSettings {
        url: "http://gateway.test/jobs/execute".to_string(),
        secret: None,
        retries: 5,
        charge_hour: 0,
        charge_minute: 0,
    };
    let Ok(job) = settings.monthly_job(&task, day) else {
        panic!("valid job");
    };
    (task, job)
}

#[tokio::test]
async fn upsert_search_and_delete_round_trip() {
    let (fake, base_url) = spawn_fake().await;
    let scheduler = client(&base_url, 0);
    let (task, job) = monthly_job(15);

    assert!(scheduler.upsert_job(job.clone()).await.is_ok());
    assert_eq!(
        fake.last_auth.lock().await.as_deref(),
        Some("Bearer sched-key")
    );

    let (_, mut moved) = monthly_job(2);
    moved.name = task.job_name();
    assert!(scheduler.upsert_job(moved).await.is_ok());

    let Ok(found) = scheduler.find_jobs("regular-payment-apply-").await else {
        panic!("search failed");
    };
    assert_eq!(found.len(), 1);
    assert_eq!(
        found.first().map(|j| j.schedule.to_string()).as_deref(),
        Some("0 0 2 * *")
    );

    assert!(scheduler.delete_job(&task.job_name()).await.is_ok());
    assert!(fake.jobs.lock().await.is_empty());
    // Already gone counts as deleted.
    assert!(scheduler.delete_job(&task.job_name()).await.is_ok());
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let (fake, base_url) = spawn_fake().await;
    fake.failures_left.store(2, Ordering::SeqCst);
    let scheduler = client(&base_url, 3);
    let (_, job) = monthly_job(1);

    assert!(scheduler.upsert_job(job).await.is_ok());
    assert_eq!(fake.requests.load(Ordering::SeqCst), 3);
    assert_eq!(fake.jobs.lock().await.len(), 1);
}

#[tokio::test]
async fn exhausted_retries_fail_create() {
    let (fake, base_url) = spawn_fake().await;
    fake.failures_left.store(10, Ordering::SeqCst);
    let scheduler = client(&base_url, 2);
    let (task, job) = monthly_job(1);

    let result = scheduler.upsert_job(job).await;
    let Err(GatewayError::SchedulerCreateFailure { job_name, reason }) = result else {
        panic!("expected a create failure");
    };
    assert_eq!(job_name, task.job_name());
    assert!(reason.contains("503"), "{reason}");
    assert_eq!(fake.requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn delete_outage_is_reported() {
    let (fake, base_url) = spawn_fake().await;
    fake.failures_left.store(1, Ordering::SeqCst);
    let scheduler = client(&base_url, 0);

    let result = scheduler.delete_job("regular-payment-apply-x").await;
    assert!(matches!(
        result,
        Err(GatewayError::SchedulerDeleteFailure { .. })
    ));
}

#[tokio::test]
async fn unreachable_scheduler_fails_create() {
    let scheduler = client("http://127.0.0.1:9", 1);
    let (_, job) = monthly_job(1);
    assert!(matches!(
        scheduler.upsert_job(job).await,
        Err(GatewayError::SchedulerCreateFailure { .. })
    ));
}
