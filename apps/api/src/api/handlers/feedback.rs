use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::handlers::dto::MessageResponse;
use crate::api::middleware::auth::AuthUser;
use crate::api::state::AppState;
use crate::domain::feedback::{Rating, RatingSummary, Report};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub rated_user_id: Uuid,
    pub stars: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub reported_user_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
}

/// Free-form product feedback. Not stored, only logged.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// POST /api/ratings
pub async fn rate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<RatingRequest>,
) -> Result<(StatusCode, Json<Rating>), ApiError> {
    let rating = state
        .feedback
        .rate(user.id, req.rated_user_id, req.stars, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

/// GET /api/users/:id/ratings
pub async fn rating_summary(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RatingSummary>, ApiError> {
    Ok(Json(state.feedback.summary_for(user_id).await?))
}

/// POST /api/reports
pub async fn report(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let report = state
        .feedback
        .report(user.id, req.reported_user_id, req.reason, req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// POST /api/feedback
pub async fn submit_feedback(
    AuthUser(user): AuthUser,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.kind.trim().is_empty() || req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Feedback type and message are required"));
    }

    info!(
        user_id = %user.id,
        kind = %req.kind,
        subject = ?req.subject,
        email = ?req.email,
        name = ?req.name,
        message = %req.message,
        "Feedback received"
    );
    Ok(Json(MessageResponse::new("Feedback sent")))
}
