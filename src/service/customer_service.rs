//! Customer profile registration and lookup.

use std::sync::Arc;

use crate::domain::{Customer, UserId};
use crate::error::GatewayError;
use crate::persistence::CustomerDirectory;

/// Longest accepted display name, in characters.
const MAX_NAME_LEN: usize = 120;

/// Thin service over the [`CustomerDirectory`].
#[derive(Debug, Clone)]
pub struct CustomerService {
    directory: Arc<dyn CustomerDirectory>,
}

impl CustomerService {
    /// Creates a new `CustomerService`.
    #[must_use]
    pub fn new(directory: Arc<dyn CustomerDirectory>) -> Self {
        Self { directory }
    }

    /// Registers the caller's customer profile.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank or overlong
    /// name, or [`GatewayError::ConstraintViolation`] if the caller is
    /// already registered.
    pub async fn register(&self, user_id: UserId, name: &str) -> Result<Customer, GatewayError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(GatewayError::InvalidRequest(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        let customer = self.directory.create(user_id, name.to_string()).await?;
        tracing::info!(customer_id = %customer.id, %user_id, "customer registered");
        Ok(customer)
    }

    /// Loads the caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the caller has not registered.
    pub async fn find_me(&self, user_id: UserId) -> Result<Customer, GatewayError> {
        self.directory.find_one_by_user_id(user_id).await
    }
}
