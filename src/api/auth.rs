//! Bearer-token authentication for the `/api/v1` routes.
//!
//! Tokens are HS256 JWTs signed with `JWT_SECRET`. The middleware verifies
//! the signature and expiry, then stores an [`AuthContext`] in the request
//! extensions for handlers to extract.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::domain::{AuthContext, Role, UserId};
use crate::error::GatewayError;

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user.
    pub sub: UserId,
    /// Granted roles; an empty list means a plain customer.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Issue time, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// Claims for `user_id` valid for `ttl` from now.
    #[must_use]
    pub fn new(user_id: UserId, roles: Vec<Role>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            roles,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Signs the claims with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the secret is empty or signing
    /// fails.
    pub fn sign(&self, secret: &str) -> Result<String, GatewayError> {
        if secret.is_empty() {
            return Err(GatewayError::Internal("JWT secret not configured".to_string()));
        }
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| GatewayError::Internal(format!("cannot sign token: {e}")))
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        let roles = if claims.roles.is_empty() {
            vec![Role::Customer]
        } else {
            claims.roles
        };
        Self {
            user_id: claims.sub,
            roles,
        }
    }
}

/// Rejects requests without a valid bearer token and injects the caller's
/// [`AuthContext`].
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] for a missing, malformed,
/// expired, or badly signed token.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = bearer_token(&headers)?;
    let claims = verify(token, &state.jwt_secret)?;
    request.extensions_mut().insert(AuthContext::from(claims));
    Ok(next.run(request).await)
}

/// Fails with [`GatewayError::Forbidden`] unless the caller is an admin.
///
/// # Errors
///
/// See above.
pub fn require_admin(auth: &AuthContext) -> Result<(), GatewayError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(GatewayError::Forbidden("admin role required".to_string()))
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, GatewayError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| GatewayError::Unauthorized("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| GatewayError::Unauthorized("invalid Authorization header".to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(GatewayError::Unauthorized("empty bearer token".to_string())),
        None => Err(GatewayError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}

fn verify(token: &str, secret: &str) -> Result<Claims, GatewayError> {
    if secret.is_empty() {
        return Err(GatewayError::Unauthorized(
            "authentication is not configured".to_string(),
        ));
    }
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| GatewayError::Unauthorized(format!("invalid token: {e}")))
}
