use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::handlers::dto::{MessageResponse, UserResponse};
use crate::api::middleware::auth::AuthUser;
use crate::api::state::AppState;
use crate::application::CategoryEligibility;
use crate::domain::history::LocationField;
use crate::domain::policy::contact_throttle::ContactUsage;
use crate::domain::policy::edit_policy::ProfileEdit;
use crate::domain::policy::premium::PlanState;
use crate::domain::user::{Grade, Location, SalaryLevel};

/// Response for the profile page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub plan: PlanState,
    pub edit_eligibility: Vec<CategoryEligibility>,
    pub contacts: ContactUsage,
}

/// Request body for a location change
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    #[serde(rename = "type")]
    pub field: String,
    pub province: String,
    pub district: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRequest {
    pub salary_level: i64,
    pub grade: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Get the caller's profile with edit eligibility and contact usage
///
/// GET /api/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let overview = state.profiles.overview(user.id).await?;
    Ok(Json(ProfileResponse {
        user: UserResponse::new(&overview.user, state.clock.now()),
        plan: overview.plan,
        edit_eligibility: overview.eligibility,
        contacts: overview.contacts,
    }))
}

/// Change current or desired location
///
/// PUT /api/user/location
pub async fn update_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<LocationRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let field: LocationField = req.field.parse().map_err(ApiError::bad_request)?;
    let location =
        Location::from_parts(&req.province, req.district.as_deref()).map_err(ApiError::bad_request)?;

    let edit = match field {
        LocationField::Current => ProfileEdit::CurrentLocation(location),
        LocationField::Desired => ProfileEdit::DesiredLocation(location),
    };
    let updated = state.profiles.edit(user.id, edit).await?;
    Ok(Json(UserResponse::new(&updated, state.clock.now())))
}

/// Change salary level and grade
///
/// PUT /api/user/salary
pub async fn update_salary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SalaryRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let level = SalaryLevel::new(req.salary_level).map_err(ApiError::bad_request)?;
    let grade: Grade = req.grade.parse().map_err(ApiError::bad_request)?;

    let updated = state
        .profiles
        .edit(user.id, ProfileEdit::SalaryAndGrade { level, grade })
        .await?;
    Ok(Json(UserResponse::new(&updated, state.clock.now())))
}

/// PUT /api/user/password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .profiles
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password changed")))
}

/// DELETE /api/user/account
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.profiles.delete_account(user.id).await?;
    Ok(Json(MessageResponse::new("Account deleted")))
}
