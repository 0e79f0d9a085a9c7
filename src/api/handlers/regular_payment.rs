//! Recurring payment handlers: list, get, create, update, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::api::dto::{
    CreateRegularPaymentRequest, PaginationMeta, PaginationParams, RegularPaymentDto,
    RegularPaymentListResponse, UpdateRegularPaymentRequest,
};
use crate::app_state::AppState;
use crate::domain::{AuthContext, RegularPaymentId};
use crate::error::{ErrorResponse, GatewayError};

/// `GET /regular-payments` — List recurring payments.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if a non-admin caller has no
/// customer profile.
#[utoipa::path(
    get,
    path = "/api/v1/regular-payments",
    tag = "Regular payments",
    summary = "List recurring payments",
    description = "Admins see every customer's payments; customers see their own.",
    params(PaginationParams),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Paginated payment list", body = RegularPaymentListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_regular_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let request = params.to_request();
    let page = state.regular_payments.find_many_for(&auth, request).await?;
    let pagination = PaginationMeta::of(&page, request);

    Ok(Json(RegularPaymentListResponse {
        data: page.map(RegularPaymentDto::from).items,
        pagination,
    }))
}

/// `GET /regular-payments/{id}` — Get one recurring payment.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if absent or owned by someone else.
#[utoipa::path(
    get,
    path = "/api/v1/regular-payments/{id}",
    tag = "Regular payments",
    summary = "Get a recurring payment",
    params(("id" = uuid::Uuid, Path, description = "Payment UUID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Payment details", body = RegularPaymentDto),
        (status = 404, description = "Payment not found", body = ErrorResponse),
    )
)]
pub async fn get_regular_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<RegularPaymentId>,
) -> Result<impl IntoResponse, GatewayError> {
    let payment = state.regular_payments.find_one_for(id, &auth).await?;
    Ok(Json(RegularPaymentDto::from(payment)))
}

/// `POST /regular-payments` — Create a recurring payment and schedule it.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a negative amount and a
/// scheduler error if the monthly job cannot be created.
#[utoipa::path(
    post,
    path = "/api/v1/regular-payments",
    tag = "Regular payments",
    summary = "Create a recurring payment",
    description = "Stores the payment for the caller and schedules a monthly job on the day of month of `dateOfCharge`.",
    request_body = CreateRegularPaymentRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Payment created", body = RegularPaymentDto),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Caller has no customer profile", body = ErrorResponse),
        (status = 502, description = "Scheduler rejected the job", body = ErrorResponse),
    )
)]
pub async fn create_regular_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateRegularPaymentRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let payment = state
        .regular_payments
        .create(req.into(), auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(RegularPaymentDto::from(payment))))
}

/// `PATCH /regular-payments/{id}` — Update a recurring payment.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an empty body,
/// [`GatewayError::NotFound`] if absent or not owned, and a scheduler error
/// if the job cannot be replaced.
#[utoipa::path(
    patch,
    path = "/api/v1/regular-payments/{id}",
    tag = "Regular payments",
    summary = "Update a recurring payment",
    description = "Applies a partial update and reschedules the monthly job.",
    params(("id" = uuid::Uuid, Path, description = "Payment UUID")),
    request_body = UpdateRegularPaymentRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Payment updated", body = RegularPaymentDto),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 502, description = "Scheduler rejected the job", body = ErrorResponse),
    )
)]
pub async fn update_regular_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<RegularPaymentId>,
    Json(req): Json<UpdateRegularPaymentRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let payment = state
        .regular_payments
        .update(id, req.into(), &auth)
        .await?;
    Ok(Json(RegularPaymentDto::from(payment)))
}

/// `DELETE /regular-payments/{id}` — Delete a recurring payment and its job.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if absent or not owned.
#[utoipa::path(
    delete,
    path = "/api/v1/regular-payments/{id}",
    tag = "Regular payments",
    summary = "Delete a recurring payment",
    params(("id" = uuid::Uuid, Path, description = "Payment UUID")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Payment not found", body = ErrorResponse),
    )
)]
pub async fn delete_regular_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<RegularPaymentId>,
) -> Result<impl IntoResponse, GatewayError> {
    state.regular_payments.delete(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recurring payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/regular-payments",
            get(list_regular_payments).post(create_regular_payment),
        )
        .route(
            "/regular-payments/{id}",
            get(get_regular_payment)
                .patch(update_regular_payment)
                .delete(delete_regular_payment),
        )
}
