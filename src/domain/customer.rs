//! Customers and the authenticated caller context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CustomerId, UserId};

/// Customer profile. Every recurring payment and expense belongs to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    /// Customer identifier.
    pub id: CustomerId,
    /// User account owning this profile.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Role carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular end user; sees only their own records.
    Customer,
    /// Operator; may read and modify any customer's records.
    Admin,
}

/// Caller identity resolved by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user.
    pub user_id: UserId,
    /// Granted roles.
    pub roles: Vec<Role>,
}

impl AuthContext {
    /// Context for a plain customer.
    #[must_use]
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            roles: vec![Role::Customer],
        }
    }

    /// Context for an administrator.
    #[must_use]
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            roles: vec![Role::Admin],
        }
    }

    /// Returns `true` if the caller holds [`Role::Admin`].
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}
