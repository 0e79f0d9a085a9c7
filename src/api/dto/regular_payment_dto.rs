//! DTOs for recurring payment endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::{
    Category, CustomerId, RegularPayment, RegularPaymentDraft, RegularPaymentId,
    RegularPaymentPatch,
};

/// Request body for `POST /api/v1/regular-payments`.
///
/// The owner is always the caller; any `customerId` in the body is ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegularPaymentRequest {
    /// Monthly amount, as a decimal string or number. Must not be negative.
    #[schema(value_type = String, example = "49.99")]
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// Reference date; its day of month is the monthly charge day.
    pub date_of_charge: DateTime<Utc>,
}

impl From<CreateRegularPaymentRequest> for RegularPaymentDraft {
    fn from(req: CreateRegularPaymentRequest) -> Self {
        Self {
            amount: req.amount,
            category: req.category,
            date_of_charge: req.date_of_charge,
        }
    }
}

/// Request body for `PATCH /api/v1/regular-payments/{id}`. At least one
/// field must be present.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegularPaymentRequest {
    /// New monthly amount.
    #[schema(value_type = Option<String>, example = "59.99")]
    pub amount: Option<Decimal>,
    /// New category.
    pub category: Option<Category>,
    /// New reference date.
    pub date_of_charge: Option<DateTime<Utc>>,
}

impl From<UpdateRegularPaymentRequest> for RegularPaymentPatch {
    fn from(req: UpdateRegularPaymentRequest) -> Self {
        Self {
            amount: req.amount,
            category: req.category,
            date_of_charge: req.date_of_charge,
        }
    }
}

/// A recurring payment as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegularPaymentDto {
    /// Payment identifier.
    pub id: RegularPaymentId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Monthly amount.
    #[schema(value_type = String, example = "49.99")]
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// Reference charge date.
    pub date_of_charge: DateTime<Utc>,
    /// Day of month the payment is charged on.
    pub charge_day: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<RegularPayment> for RegularPaymentDto {
    fn from(payment: RegularPayment) -> Self {
        Self {
            charge_day: payment.charge_day(),
            id: payment.id,
            customer_id: payment.customer_id,
            amount: payment.amount,
            category: payment.category,
            date_of_charge: payment.date_of_charge,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

/// Paginated recurring payment list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegularPaymentListResponse {
    /// Payments on this page.
    pub data: Vec<RegularPaymentDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
