use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::user::{Grade, Location, SalaryLevel, Sector, UserProfile};

/// Account as returned to its owner and to admins
///
/// Never includes the password hash or reset token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub phone: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub sector: Sector,
    pub salary_level: SalaryLevel,
    pub grade: Grade,
    pub current_location: Location,
    pub desired_location: Location,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_banned: bool,
    pub is_admin: bool,
    pub permutation_completed: bool,
    pub profile_last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    /// `is_premium` reflects the plan in force at `now`, swept or not.
    pub fn new(user: &UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            phone: user.phone.to_string(),
            email: user.email.as_ref().map(|e| e.as_str().to_string()),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            sector: user.sector.clone(),
            salary_level: user.salary_level,
            grade: user.grade,
            current_location: user.current_location.clone(),
            desired_location: user.desired_location.clone(),
            is_premium: user.has_active_premium(now),
            premium_expires_at: user.premium.expires_at,
            is_active: user.is_active,
            is_banned: user.is_banned,
            is_admin: user.is_admin,
            permutation_completed: user.permutation_completed,
            profile_last_updated: user.profile_last_updated,
            created_at: user.created_at,
        }
    }
}

/// Session token plus the account it belongs to
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
