//! Expense read handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::api::dto::{ExpenseDto, ExpenseListResponse, PaginationMeta, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{AuthContext, ExpenseId};
use crate::error::{ErrorResponse, GatewayError};

/// `GET /expenses` — List expenses.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if a non-admin caller has no
/// customer profile.
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    tag = "Expenses",
    summary = "List expenses",
    description = "Admins see every customer's expenses; customers see their own, newest first.",
    params(PaginationParams),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Paginated expense list", body = ExpenseListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let request = params.to_request();
    let page = state.expenses.find_many_for(&auth, request).await?;
    let pagination = PaginationMeta::of(&page, request);

    Ok(Json(ExpenseListResponse {
        data: page.map(ExpenseDto::from).items,
        pagination,
    }))
}

/// `GET /expenses/{id}` — Get one expense.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if absent or owned by someone else.
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{id}",
    tag = "Expenses",
    summary = "Get an expense",
    params(("id" = uuid::Uuid, Path, description = "Expense UUID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Expense details", body = ExpenseDto),
        (status = 404, description = "Expense not found", body = ErrorResponse),
    )
)]
pub async fn get_expense(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<ExpenseId>,
) -> Result<impl IntoResponse, GatewayError> {
    let expense = state.expenses.find_one_for(id, &auth).await?;
    Ok(Json(ExpenseDto::from(expense)))
}

/// Expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses))
        .route("/expenses/{id}", get(get_expense))
}
