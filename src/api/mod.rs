//! REST API layer: route handlers, DTOs, authentication, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1` behind bearer auth. The
//! scheduler callback, health check, and category catalog sit at the root.

pub mod auth;
pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the complete application router over `state`.
pub fn build_router(state: AppState) -> Router {
    let protected = handlers::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_auth,
    ));

    let router = Router::new()
        .nest("/api/v1", protected)
        .merge(handlers::job::callback_routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(openapi::swagger_ui());

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
