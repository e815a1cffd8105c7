use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::handlers::dto::{MessageResponse, SessionResponse, UserResponse};
use crate::api::state::AppState;
use crate::application::RegisterInput;
use crate::auth::jwt::create_token;
use crate::domain::user::UserProfile;

/// Request body for user registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub phone: String,
    pub email: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub sector: String,
    pub salary_level: i64,
    pub grade: String,
    pub current_province: String,
    pub current_district: Option<String>,
    pub desired_province: String,
    pub desired_district: Option<String>,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        Self {
            phone: req.phone,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            sector: req.sector,
            salary_level: req.salary_level,
            grade: req.grade,
            current_province: req.current_province,
            current_district: req.current_district,
            desired_province: req.desired_province,
            desired_district: req.desired_district,
        }
    }
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub phone: String,
    pub token: String,
    pub new_password: String,
}

fn open_session(state: &AppState, user: &UserProfile) -> Result<SessionResponse, ApiError> {
    let now = state.clock.now();
    let token = create_token(
        user.id,
        user.phone.as_str(),
        &state.config.jwt_secret,
        now,
        state.config.jwt_ttl,
    )
    .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    Ok(SessionResponse {
        token,
        user: UserResponse::new(user, now),
    })
}

/// Register a new user
///
/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let user = state.accounts.register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(open_session(&state, &user)?)))
}

/// Login with phone number and password
///
/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = state.accounts.login(&req.phone, &req.password).await?;
    Ok(Json(open_session(&state, &user)?))
}

/// Ask an admin for a password reset
///
/// POST /api/auth/request-password-reset
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.resets.request_reset(&req.phone).await?;
    Ok(Json(MessageResponse::new(
        "Request received. An administrator will send you a reset link.",
    )))
}

/// Redeem a reset token
///
/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .resets
        .reset_password(&req.phone, &req.token, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated. You can now log in.")))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
