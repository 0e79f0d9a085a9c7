//! End-to-end tests driving the full router over the in-memory store and
//! scheduler.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;

use finance_gateway::api::auth::Claims;
use finance_gateway::api::build_router;
use finance_gateway::app_state::{AppState, Backends};
use finance_gateway::domain::{Role, UserId};
use finance_gateway::persistence::{
    CustomerDirectory, ExpenseStore, MemoryStore, RegularPaymentStore,
};
use finance_gateway::scheduler::{
    CallbackSettings, InMemoryScheduler, JOB_SECRET_HEADER, JobScheduler,
};

const JWT_SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    scheduler: Arc<InMemoryScheduler>,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new(job_secret: Option<&str>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let scheduler = Arc::new(InMemoryScheduler::new());
        let backends = Backends {
            regular_payments: Arc::clone(&store) as Arc<dyn RegularPaymentStore>,
            expenses: Arc::clone(&store) as Arc<dyn ExpenseStore>,
            customers: Arc::clone(&store) as Arc<dyn CustomerDirectory>,
            scheduler: Arc::clone(&scheduler) as Arc<dyn JobScheduler>,
        };
        let callbacks = CallbackSettings {
            url: "http://gateway.test/jobs/execute".to_string(),
            secret: job_secret.map(str::to_string),
            retries: 5,
            charge_hour: 0,
            charge_minute: 0,
        };
        let state = AppState::new(backends, callbacks, JWT_SECRET);
        Self {
            router: build_router(state),
            scheduler,
            store,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_with(method, uri, token, &[], body).await
    }

    async fn send_with(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = builder.body(body) else {
            panic!("invalid request");
        };

        let Ok(response) = self.router.clone().oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("cannot read body");
        };
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            let Ok(value) = serde_json::from_slice(&bytes) else {
                panic!("body is not JSON: {}", String::from_utf8_lossy(&bytes));
            };
            value
        };
        (status, value)
    }

    /// Registers a fresh customer and returns their token.
    async fn customer(&self, name: &str) -> String {
        let token = token(UserId::new(), vec![Role::Customer]);
        let (status, _) = self
            .send("POST", "/api/v1/customers", Some(&token), Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        token
    }

    async fn create_payment(&self, token: &str, date: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/regular-payments",
                Some(token),
                Some(json!({ "amount": "50.00", "category": "FOOD", "dateOfCharge": date })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn token(user_id: UserId, roles: Vec<Role>) -> String {
    let Ok(token) = Claims::new(user_id, roles, Duration::minutes(10)).sign(JWT_SECRET) else {
        panic!("cannot sign token");
    };
    token
}

fn job_name(payment: &Value) -> String {
    let Some(id) = payment["id"].as_str() else {
        panic!("payment has no id");
    };
    format!("regular-payment-apply-{id}")
}

#[tokio::test]
async fn create_schedules_monthly_job() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;

    let payment = app.create_payment(&token, "2024-03-15T00:00:00Z").await;
    assert_eq!(payment["chargeDay"], 15);
    assert_eq!(payment["category"], "FOOD");

    let Some(job) = app.scheduler.job(&job_name(&payment)).await else {
        panic!("job should be scheduled");
    };
    assert_eq!(job.schedule.to_string(), "0 0 15 * *");
    assert_eq!(job.executor.url, "http://gateway.test/jobs/execute");
}

#[tokio::test]
async fn update_reschedules_same_job() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;
    let payment = app.create_payment(&token, "2024-03-15T00:00:00Z").await;
    let Some(id) = payment["id"].as_str() else {
        panic!("payment has no id");
    };

    let (status, updated) = app
        .send(
            "PATCH",
            &format!("/api/v1/regular-payments/{id}"),
            Some(&token),
            Some(json!({ "dateOfCharge": "2024-06-02T00:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["chargeDay"], 2);

    assert_eq!(app.scheduler.len().await, 1);
    let Some(job) = app.scheduler.job(&job_name(&payment)).await else {
        panic!("job should be scheduled");
    };
    assert_eq!(job.schedule.to_string(), "0 0 2 * *");
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;
    let payment = app.create_payment(&token, "2024-03-15T00:00:00Z").await;
    let Some(id) = payment["id"].as_str() else {
        panic!("payment has no id");
    };

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/api/v1/regular-payments/{id}"),
            Some(&token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn delete_removes_payment_and_job() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;
    let payment = app.create_payment(&token, "2024-03-15T00:00:00Z").await;
    let Some(id) = payment["id"].as_str() else {
        panic!("payment has no id");
    };
    let uri = format!("/api/v1/regular-payments/{id}");

    let (status, _) = app.send("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.scheduler.is_empty().await);

    let (status, _) = app.send("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn callback_materializes_expense() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;
    let payment = app.create_payment(&token, "2024-03-15T00:00:00Z").await;

    let Some(job) = app.scheduler.job(&job_name(&payment)).await else {
        panic!("job should be scheduled");
    };
    let Ok(envelope) = serde_json::from_str::<Value>(&job.executor.body) else {
        panic!("job body is not JSON");
    };

    let (status, _) = app
        .send("POST", "/jobs/execute", None, Some(envelope))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.store.expense_count().await, 1);

    let (status, list) = app.send("GET", "/api/v1/expenses", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["total"], 1);
    let expense = &list["data"][0];
    assert_eq!(expense["customerId"], payment["customerId"]);
    assert_eq!(expense["amount"], payment["amount"]);
    assert_eq!(expense["category"], "FOOD");
    assert_eq!(expense["date"], payment["dateOfCharge"]);
}

#[tokio::test]
async fn callback_for_deleted_payment_writes_nothing() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;
    let payment = app.create_payment(&token, "2024-03-15T00:00:00Z").await;
    let Some(job) = app.scheduler.job(&job_name(&payment)).await else {
        panic!("job should be scheduled");
    };
    let Ok(envelope) = serde_json::from_str::<Value>(&job.executor.body) else {
        panic!("job body is not JSON");
    };
    let Some(id) = payment["id"].as_str() else {
        panic!("payment has no id");
    };
    let (status, _) = app
        .send(
            "DELETE",
            &format!("/api/v1/regular-payments/{id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send("POST", "/jobs/execute", None, Some(envelope))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.expense_count().await, 0);
}

#[tokio::test]
async fn unknown_job_type_is_rejected() {
    let app = TestApp::new(None);
    let (status, body) = app
        .send(
            "POST",
            "/jobs/execute",
            None,
            Some(json!({ "jobType": "send-newsletter", "jobName": "x", "payload": {} })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn callback_requires_configured_secret() {
    let app = TestApp::new(Some("s3cret"));
    let token = app.customer("Ada").await;
    let payment = app.create_payment(&token, "2024-03-15T00:00:00Z").await;
    let Some(job) = app.scheduler.job(&job_name(&payment)).await else {
        panic!("job should be scheduled");
    };
    assert_eq!(
        job.executor.headers.get(JOB_SECRET_HEADER).map(String::as_str),
        Some("s3cret")
    );
    let Ok(envelope) = serde_json::from_str::<Value>(&job.executor.body) else {
        panic!("job body is not JSON");
    };

    let (status, _) = app
        .send("POST", "/jobs/execute", None, Some(envelope.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send_with(
            "POST",
            "/jobs/execute",
            None,
            &[(JOB_SECRET_HEADER, "s3cret")],
            Some(envelope),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn foreign_payment_looks_absent() {
    let app = TestApp::new(None);
    let owner = app.customer("Ada").await;
    let stranger = app.customer("Eve").await;
    let payment = app.create_payment(&owner, "2024-03-15T00:00:00Z").await;
    let Some(id) = payment["id"].as_str() else {
        panic!("payment has no id");
    };

    let (foreign_status, foreign_body) = app
        .send(
            "GET",
            &format!("/api/v1/regular-payments/{id}"),
            Some(&stranger),
            None,
        )
        .await;
    let (missing_status, missing_body) = app
        .send(
            "GET",
            &format!("/api/v1/regular-payments/{}", uuid::Uuid::new_v4()),
            Some(&stranger),
            None,
        )
        .await;
    assert_eq!(foreign_status, StatusCode::NOT_FOUND);
    assert_eq!(missing_status, StatusCode::NOT_FOUND);
    assert_eq!(foreign_body, missing_body);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/api/v1/regular-payments/{id}"),
            Some(&stranger),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.scheduler.len().await, 1);
}

#[tokio::test]
async fn scheduler_outage_fails_create_without_residue() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;
    app.scheduler.fail_creates(true);

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/regular-payments",
            Some(&token),
            Some(json!({ "amount": 10, "category": "HOUSING", "dateOfCharge": "2024-01-31T00:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], 3101);

    let (status, list) = app
        .send("GET", "/api/v1/regular-payments", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn negative_amount_is_rejected_before_scheduling() {
    let app = TestApp::new(None);
    let token = app.customer("Ada").await;
    let (status, _) = app
        .send(
            "POST",
            "/api/v1/regular-payments",
            Some(&token),
            Some(json!({ "amount": "-1", "category": "FOOD", "dateOfCharge": "2024-01-10T00:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.scheduler.upsert_calls(), 0);
}

#[tokio::test]
async fn admin_lists_everything_and_jobs() {
    let app = TestApp::new(None);
    for name in ["Ada", "Grace"] {
        let token = app.customer(name).await;
        app.create_payment(&token, "2024-03-15T00:00:00Z").await;
    }
    let admin = token(UserId::new(), vec![Role::Admin]);

    let (status, list) = app
        .send("GET", "/api/v1/regular-payments?page=1&per_page=1", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["total"], 2);
    assert_eq!(list["pagination"]["totalPages"], 2);

    let (status, jobs) = app
        .send("GET", "/api/v1/jobs?q=regular-payment-apply-", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(jobs["data"].as_array().map(Vec::len), Some(2));

    let customer = app.customer("Eve").await;
    let (status, _) = app.send("GET", "/api/v1/jobs", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = TestApp::new(None);
    let (status, body) = app.send("GET", "/api/v1/regular-payments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 1101);

    let (status, _) = app
        .send("GET", "/api/v1/expenses", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn system_routes_are_public() {
    let app = TestApp::new(None);
    let (status, health) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    let (status, categories) = app.send("GET", "/config/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories.as_array().map(Vec::len), Some(11));
}
