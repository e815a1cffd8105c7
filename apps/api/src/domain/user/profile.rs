use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::value_objects::{Email, Grade, Location, Phone, SalaryLevel, Sector};
use crate::domain::policy::premium::{self, PlanState};

/// Per-day WhatsApp contact usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCounter {
    pub count: u32,
    pub last_reset: DateTime<Utc>,
}

/// Plan fields as stored. Use [`UserProfile::plan_state`] to interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumState {
    pub is_premium: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub promoted_by: Option<Uuid>,
}

/// Last successful edit of each governed field category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMarkers {
    pub salary: Option<DateTime<Utc>>,
    pub current_location: Option<DateTime<Utc>>,
    pub desired_location: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PasswordResetState {
    pub requested_at: Option<DateTime<Utc>>,
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub consumed_at: Option<DateTime<Utc>>,
}

/// User aggregate: a public servant looking for a swap partner.
///
/// # Invariants
/// - `first_name`, `last_name` and `sector` never change after registration
/// - A banned user is never active
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub phone: Phone,
    pub email: Option<Email>,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub sector: Sector,
    pub salary_level: SalaryLevel,
    pub grade: Grade,
    pub current_location: Location,
    pub desired_location: Location,
    pub premium: PremiumState,
    pub contacts: ContactCounter,
    pub is_active: bool,
    pub is_banned: bool,
    pub is_admin: bool,
    pub permutation_completed: bool,
    pub edits: EditMarkers,
    pub password_reset: PasswordResetState,
    pub profile_last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Validated registration data.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub phone: Phone,
    pub email: Option<Email>,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub sector: Sector,
    pub salary_level: SalaryLevel,
    pub grade: Grade,
    pub current_location: Location,
    pub desired_location: Location,
}

impl UserProfile {
    /// Creates a fresh, active, free-plan account.
    pub fn register(new_user: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone: new_user.phone,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            sector: new_user.sector,
            salary_level: new_user.salary_level,
            grade: new_user.grade,
            current_location: new_user.current_location,
            desired_location: new_user.desired_location,
            premium: PremiumState::default(),
            contacts: ContactCounter {
                count: 0,
                last_reset: now,
            },
            is_active: true,
            is_banned: false,
            is_admin: false,
            permutation_completed: false,
            edits: EditMarkers::default(),
            password_reset: PasswordResetState::default(),
            profile_last_updated: now,
            created_at: now,
        }
    }

    /// Plan in force at `now`, regardless of whether the expiry sweep ran.
    pub fn plan_state(&self, now: DateTime<Utc>) -> PlanState {
        premium::plan_state(&self.premium, now)
    }

    pub fn has_active_premium(&self, now: DateTime<Utc>) -> bool {
        self.plan_state(now) == PlanState::PremiumActive
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the user may appear in other users' search results.
    pub fn is_listed(&self) -> bool {
        self.is_active && !self.is_banned && !self.is_admin
    }

    /// Marks the account banned; a banned account is always inactive.
    pub fn ban(&mut self) {
        self.is_banned = true;
        self.is_active = false;
    }
}
