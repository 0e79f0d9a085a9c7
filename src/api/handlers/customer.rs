//! Customer profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use crate::api::dto::{CreateCustomerRequest, CustomerDto};
use crate::app_state::AppState;
use crate::domain::AuthContext;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /customers` — Register the caller's customer profile.
///
/// # Errors
///
/// Returns [`GatewayError::ConstraintViolation`] if the caller is already
/// registered.
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "Customers",
    summary = "Register a customer profile",
    request_body = CreateCustomerRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Profile created", body = CustomerDto),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 409, description = "Profile already exists", body = ErrorResponse),
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let customer = state.customers.register(auth.user_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(CustomerDto::from(customer))))
}

/// `GET /customers/me` — The caller's own profile.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the caller has not registered.
#[utoipa::path(
    get,
    path = "/api/v1/customers/me",
    tag = "Customers",
    summary = "Get own customer profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile", body = CustomerDto),
        (status = 404, description = "Not registered", body = ErrorResponse),
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, GatewayError> {
    let customer = state.customers.find_me(auth.user_id).await?;
    Ok(Json(CustomerDto::from(customer)))
}

/// Customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(create_customer))
        .route("/customers/me", get(get_me))
}
