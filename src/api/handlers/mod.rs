//! REST endpoint handlers organized by resource.

pub mod customer;
pub mod expense;
pub mod job;
pub mod regular_payment;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all authenticated resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(regular_payment::routes())
        .merge(expense::routes())
        .merge(customer::routes())
        .merge(job::routes())
}
