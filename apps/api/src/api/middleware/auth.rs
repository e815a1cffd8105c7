use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::verify_token;
use crate::domain::clock::Clock;
use crate::domain::user::UserProfile;

/// Authenticated caller for protected routes
///
/// Resolves the bearer token to a stored account. Deleted, inactive and
/// banned accounts are rejected even with a valid token.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(
///     AuthUser(user): AuthUser,
/// ) -> Result<String, ApiError> {
///     Ok(format!("Hello {}", user.full_name()))
/// }
/// ```
pub struct AuthUser(pub UserProfile);

/// Authenticated caller with the admin flag set
pub struct AdminUser(pub UserProfile);

fn bearer_subject(parts: &Parts, state: &AppState) -> Result<Uuid, ApiError> {
    // Extract the authorization header
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    // Extract bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>"))?;

    let claims = verify_token(token, &state.config.jwt_secret, state.clock.now())
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    Ok(claims.sub)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = bearer_subject(parts, state)?;
        let user = state.accounts.current_user(user_id).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = bearer_subject(parts, state)?;
        let user = state.accounts.require_admin(user_id).await?;
        Ok(AdminUser(user))
    }
}
