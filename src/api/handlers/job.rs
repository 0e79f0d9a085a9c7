//! Scheduler callback and job listing handlers.
//!
//! `POST /jobs/execute` sits outside bearer auth: it is called by the
//! external scheduler, optionally authenticated by a shared secret header.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use crate::api::auth::require_admin;
use crate::api::dto::{JobListResponse, JobQuery};
use crate::app_state::AppState;
use crate::domain::{AuthContext, JobEnvelope};
use crate::error::{ErrorResponse, GatewayError};
use crate::scheduler::JOB_SECRET_HEADER;

/// `POST /jobs/execute` — Execute a fired scheduler job.
///
/// # Errors
///
/// - [`GatewayError::Unauthorized`] if a callback secret is configured and
///   the request does not carry it.
/// - [`GatewayError::UnknownJobType`] for an unrecognized `jobType`.
/// - [`GatewayError::NotFound`] if the target payment no longer exists.
#[utoipa::path(
    post,
    path = "/jobs/execute",
    tag = "Jobs",
    summary = "Execute a scheduled job",
    description = "Callback target for the external scheduler. A `regular-payment-apply` job writes one expense copied from the payment.",
    request_body = JobEnvelope,
    responses(
        (status = 204, description = "Job executed, or skipped as not due"),
        (status = 400, description = "Unknown job type or bad payload", body = ErrorResponse),
        (status = 401, description = "Missing or wrong job secret", body = ErrorResponse),
        (status = 404, description = "Target no longer exists", body = ErrorResponse),
    )
)]
pub async fn execute_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(envelope): Json<JobEnvelope>,
) -> Result<impl IntoResponse, GatewayError> {
    if let Some(expected) = state.job_secret.as_deref() {
        let presented = headers
            .get(JOB_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            tracing::warn!(job_name = %envelope.job_name, "job callback with bad secret");
            return Err(GatewayError::Unauthorized("invalid job secret".to_string()));
        }
    }

    state.jobs.execute(&envelope).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /jobs` — List scheduler jobs by name prefix (admin only).
///
/// # Errors
///
/// Returns [`GatewayError::Forbidden`] for non-admins.
#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    tag = "Jobs",
    summary = "List scheduled jobs",
    params(JobQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Matching jobs", body = JobListResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<JobQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    require_admin(&auth)?;
    let data = state.jobs.find_jobs(&query.q).await?;
    Ok(Json(JobListResponse { data }))
}

/// Authenticated job routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/jobs", get(list_jobs))
}

/// Scheduler callback route, mounted at the root without bearer auth.
pub fn callback_routes() -> Router<AppState> {
    Router::new().route("/jobs/execute", post(execute_job))
}
