//! DTOs for customer endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Customer, CustomerId, UserId};

/// Request body for `POST /api/v1/customers`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    /// Display name.
    pub name: String,
}

/// A customer profile as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    /// Customer identifier.
    pub id: CustomerId,
    /// Owning user account.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            user_id: customer.user_id,
            name: customer.name,
            created_at: customer.created_at,
        }
    }
}
