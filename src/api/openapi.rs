//! OpenAPI document for the REST surface, served by Swagger UI when the
//! `swagger-ui` feature is enabled.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    CreateCustomerRequest, CreateRegularPaymentRequest, CustomerDto, ExpenseDto,
    ExpenseListResponse, JobListResponse, PaginationMeta, RegularPaymentDto,
    RegularPaymentListResponse, UpdateRegularPaymentRequest,
};
use crate::api::handlers::{customer, expense, job, regular_payment, system};
use crate::domain::{Category, CustomerId, ExpenseId, JobEnvelope, RegularPaymentId, UserId};
use crate::error::{ErrorBody, ErrorResponse};
use crate::scheduler::{HttpExecutor, JobDefinition};

/// Generated OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "finance-gateway",
        description = "Personal finance API: customers, expenses, and scheduled recurring payments."
    ),
    paths(
        regular_payment::list_regular_payments,
        regular_payment::get_regular_payment,
        regular_payment::create_regular_payment,
        regular_payment::update_regular_payment,
        regular_payment::delete_regular_payment,
        expense::list_expenses,
        expense::get_expense,
        customer::create_customer,
        customer::get_me,
        job::execute_job,
        job::list_jobs,
        system::health_handler,
        system::categories_handler,
    ),
    components(schemas(
        Category,
        CustomerId,
        ExpenseId,
        RegularPaymentId,
        UserId,
        CreateRegularPaymentRequest,
        UpdateRegularPaymentRequest,
        RegularPaymentDto,
        RegularPaymentListResponse,
        ExpenseDto,
        ExpenseListResponse,
        CreateCustomerRequest,
        CustomerDto,
        PaginationMeta,
        JobEnvelope,
        JobDefinition,
        HttpExecutor,
        JobListResponse,
        system::HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Regular payments", description = "Recurring payment templates"),
        (name = "Expenses", description = "Materialized expenses"),
        (name = "Customers", description = "Customer profiles"),
        (name = "Jobs", description = "Scheduler callbacks and job inspection"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI at `/swagger-ui`, backed by `/api-docs/openapi.json`.
#[cfg(feature = "swagger-ui")]
#[must_use]
pub fn swagger_ui() -> utoipa_swagger_ui::SwaggerUi {
    utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
