use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::dto::{MessageResponse, UserResponse};
use crate::api::middleware::auth::AdminUser;
use crate::api::state::AppState;
use crate::application::{AdminStats, PendingReset, SweepReport};
use crate::domain::feedback::Report;
use crate::domain::history::LocationHistoryRecord;
use crate::domain::user::PremiumState;

const DEFAULT_HISTORY_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub days: i64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Defaults to the last 30 days.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumResponse {
    pub user_id: Uuid,
    pub is_premium: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Token to hand to the user out of band, e.g. over WhatsApp
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokenResponse {
    pub token: String,
    pub reset_link: String,
    pub expires_at: DateTime<Utc>,
}

/// Relative link to the reset page with phone and token pre-filled.
pub fn reset_link(phone: &str, token: &str) -> String {
    format!(
        "/reset-password?phone={}&token={}",
        phone.replace('+', "%2B"),
        token
    )
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let now = state.clock.now();
    let users = state.admin.list_users().await?;
    Ok(Json(users.iter().map(|u| UserResponse::new(u, now)).collect()))
}

/// GET /api/admin/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.admin.user(user_id).await?;
    Ok(Json(UserResponse::new(&user, state.clock.now())))
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<AdminStats>, ApiError> {
    Ok(Json(state.admin.stats().await?))
}

/// PUT /api/admin/users/:id/status
pub async fn set_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.admin.set_active(admin.id, user_id, req.is_active).await?;
    let message = if req.is_active { "User activated" } else { "User deactivated" };
    Ok(Json(MessageResponse::new(message)))
}

/// POST /api/admin/users/:id/ban
pub async fn ban(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.admin.ban(admin.id, user_id).await?;
    Ok(Json(MessageResponse::new("User banned")))
}

/// Grant premium for 7, 30, 90, 180 or 365 days
///
/// POST /api/admin/users/:id/premium
pub async fn promote(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<PromoteRequest>,
) -> Result<Json<PremiumResponse>, ApiError> {
    let PremiumState {
        is_premium,
        expires_at,
        ..
    } = state.premium.promote(admin.id, user_id, req.days).await?;

    Ok(Json(PremiumResponse {
        user_id,
        is_premium,
        expires_at,
    }))
}

/// DELETE /api/admin/users/:id/premium
pub async fn demote(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.premium.demote(admin.id, user_id).await?;
    Ok(Json(MessageResponse::new("Premium removed")))
}

/// Run the expiry sweep now instead of waiting for the next tick
///
/// POST /api/admin/premium/sweep
pub async fn sweep_premium(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<SweepReport>, ApiError> {
    Ok(Json(state.premium.sweep_expired().await?))
}

/// GET /api/admin/location-history?since=<RFC 3339>
pub async fn location_history(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LocationHistoryRecord>>, ApiError> {
    let since = query
        .since
        .unwrap_or_else(|| state.clock.now() - Duration::days(DEFAULT_HISTORY_DAYS));
    Ok(Json(state.admin.location_history_since(since).await?))
}

/// GET /api/admin/reports
pub async fn reports(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Report>>, ApiError> {
    Ok(Json(state.feedback.reports().await?))
}

/// GET /api/admin/password-resets
pub async fn pending_resets(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<PendingReset>>, ApiError> {
    Ok(Json(state.resets.pending_requests().await?))
}

/// Issue a single-use reset token; any earlier token stops working
///
/// POST /api/admin/users/:id/reset-token
pub async fn issue_reset_token(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<IssuedTokenResponse>, ApiError> {
    let user = state.admin.user(user_id).await?;
    let issued = state.resets.issue_token(admin.id, user.id).await?;

    Ok(Json(IssuedTokenResponse {
        reset_link: reset_link(user.phone.as_str(), &issued.token),
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_escapes_plus() {
        assert_eq!(
            reset_link("+258841234567", "abc"),
            "/reset-password?phone=%2B258841234567&token=abc"
        );
    }
}
